//! Background script runs
//!
//! A [`ScriptRunner`] moves the engine and the execution context onto a tokio
//! task. The caller keeps a [`StopHandle`] to cancel the run and a watch
//! receiver to follow its state; joining returns the document to the editor.

use crate::context::ExecutionContext;
use crate::engine::{Engine, EngineState, Step};
use crate::error::EngineResult;
use chrono::{DateTime, Utc};
use mp_script::ScriptDocument;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};
use ulid::Ulid;

/// Cooperative cancellation for a running script
///
/// A stop request is seen between commands; a command in flight always
/// finishes.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    async fn stopped(&self) {
        if !self.is_stopped() {
            self.notify.notified().await;
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Ulid,
    pub state: EngineState,
    /// Commands executed, `Stop` included
    pub steps: usize,
    /// Error that ended the run, if any
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// What a finished run hands back
pub struct RunOutcome {
    pub report: RunReport,
    /// The document, with its pointer where execution ended
    pub document: ScriptDocument,
    /// The engine, ready for the next run
    pub engine: Engine,
}

/// A script running on a background task
pub struct ScriptRunner {
    run_id: Ulid,
    stop: StopHandle,
    status: watch::Receiver<EngineState>,
    handle: JoinHandle<RunOutcome>,
}

impl ScriptRunner {
    /// Run `document` on a new task after `start_delay`
    pub fn spawn(engine: Engine, document: ScriptDocument, start_delay: Duration) -> Self {
        let run_id = Ulid::new();
        let stop = StopHandle::new();
        let status = engine.subscribe();

        let span = info_span!("run", run_id = %run_id);
        let handle = tokio::spawn(
            run(
                engine,
                ExecutionContext::new(document),
                start_delay,
                stop.clone(),
                run_id,
            )
            .instrument(span),
        );

        Self {
            run_id,
            stop,
            status,
            handle,
        }
    }

    pub fn run_id(&self) -> Ulid {
        self.run_id
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Follow the engine state
    pub fn status(&self) -> watch::Receiver<EngineState> {
        self.status.clone()
    }

    /// Wait for the run to end
    pub async fn join(self) -> EngineResult<RunOutcome> {
        Ok(self.handle.await?)
    }
}

async fn run(
    mut engine: Engine,
    mut ctx: ExecutionContext,
    start_delay: Duration,
    stop: StopHandle,
    run_id: Ulid,
) -> RunOutcome {
    let started_at = Utc::now();
    let mut steps = 0;
    let mut error = None;

    if !start_delay.is_zero() {
        info!("Starting in {:?}", start_delay);
        tokio::select! {
            _ = tokio::time::sleep(start_delay) => {}
            _ = stop.stopped() => {}
        }
    }

    let cancelled_early = stop.is_stopped();
    if cancelled_early {
        info!("Stopped before the first command");
    } else if let Err(e) = engine.start(&mut ctx) {
        error = Some(e.to_string());
    } else {
        while engine.status() == EngineState::Running {
            if stop.is_stopped() {
                // Only fails if the engine already left the running state
                let _ = engine.stop();
                break;
            }
            match engine.step(&mut ctx).await {
                Ok(Step::Executed { .. } | Step::Stopped { .. }) => steps += 1,
                Ok(Step::Finished) => {}
                Err(e) => {
                    steps += 1;
                    error = Some(e.to_string());
                }
            }
        }
    }

    let state = if cancelled_early {
        EngineState::Stopped
    } else {
        engine.status()
    };
    let report = RunReport {
        run_id,
        state,
        steps,
        error,
        started_at,
        finished_at: Utc::now(),
    };

    match &report.error {
        Some(e) => warn!(steps, "Run ended {}: {}", state, e),
        None => info!(steps, "Run ended {}", state),
    }

    RunOutcome {
        report,
        document: ctx.into_document(),
        engine,
    }
}
