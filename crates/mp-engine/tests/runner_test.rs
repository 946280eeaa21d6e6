//! Background runs: start delay, cancellation and reports

mod common;

use common::{document, engine, text, FakeLocator, RecordingExecutor};
use mp_core::{CommandKind, MemoryDataSource};
use mp_engine::{EngineState, ScriptRunner};
use std::sync::Arc;
use std::time::Duration;

fn collaborators() -> (Arc<RecordingExecutor>, Arc<FakeLocator>) {
    (
        Arc::new(RecordingExecutor::default()),
        Arc::new(FakeLocator::default()),
    )
}

#[tokio::test]
async fn test_run_to_completion() {
    let (executor, locator) = collaborators();
    let engine = engine(executor.clone(), locator, MemoryDataSource::new());
    let doc = document(vec![text("a"), text("b")]);

    let runner = ScriptRunner::spawn(engine, doc, Duration::ZERO);
    let run_id = runner.run_id();
    let status = runner.status();
    let outcome = runner.join().await.unwrap();

    assert_eq!(outcome.report.run_id, run_id);
    assert_eq!(outcome.report.state, EngineState::Completed);
    assert_eq!(outcome.report.steps, 2);
    assert!(outcome.report.error.is_none());
    assert!(outcome.report.finished_at >= outcome.report.started_at);
    assert_eq!(*status.borrow(), EngineState::Completed);
    assert_eq!(executor.texts(), vec!["a", "b"]);

    // Pointer left on the last command reached
    assert_eq!(outcome.document.pointer(), Some(1));
    assert_eq!(outcome.engine.status(), EngineState::Completed);
}

#[tokio::test]
async fn test_stop_request_ends_endless_script() {
    let (executor, locator) = collaborators();
    let mut engine = engine(executor.clone(), locator, MemoryDataSource::new());
    engine.configure(0.001, 1, false, true).unwrap();
    let doc = document(vec![
        CommandKind::Label("L".into()),
        text("hi"),
        CommandKind::Run("L".into()),
    ]);

    let runner = ScriptRunner::spawn(engine, doc, Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(50)).await;
    runner.stop_handle().stop();
    let outcome = runner.join().await.unwrap();

    assert_eq!(outcome.report.state, EngineState::Stopped);
    assert!(outcome.report.error.is_none());
    assert!(outcome.report.steps >= 3);
    assert!(!executor.texts().is_empty());
}

#[tokio::test]
async fn test_stop_during_start_delay() {
    let (executor, locator) = collaborators();
    let engine = engine(executor.clone(), locator, MemoryDataSource::new());
    let doc = document(vec![text("a")]);

    let runner = ScriptRunner::spawn(engine, doc, Duration::from_secs(60));
    runner.stop_handle().stop();
    let outcome = runner.join().await.unwrap();

    assert_eq!(outcome.report.state, EngineState::Stopped);
    assert_eq!(outcome.report.steps, 0);
    assert!(executor.actions().is_empty());
    assert_eq!(outcome.document.len(), 1);
}

#[tokio::test]
async fn test_failed_run_is_reported() {
    let (executor, locator) = collaborators();
    let engine = engine(executor, locator, MemoryDataSource::new());
    let doc = document(vec![text("a"), CommandKind::NextElementField("ghost".into())]);

    let outcome = ScriptRunner::spawn(engine, doc, Duration::ZERO)
        .join()
        .await
        .unwrap();

    assert_eq!(outcome.report.state, EngineState::Errored);
    assert_eq!(outcome.report.steps, 2);
    let error = outcome.report.error.unwrap();
    assert!(error.contains("ghost"), "unexpected error: {}", error);
    assert_eq!(outcome.document.pointer(), Some(1));
}

#[tokio::test]
async fn test_report_serializes() {
    let (executor, locator) = collaborators();
    let engine = engine(executor, locator, MemoryDataSource::new());

    let outcome = ScriptRunner::spawn(engine, document(vec![]), Duration::ZERO)
        .join()
        .await
        .unwrap();

    let json = serde_json::to_value(&outcome.report).unwrap();
    assert_eq!(json["state"], "completed");
    assert_eq!(json["steps"], 0);
}
