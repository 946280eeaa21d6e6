//! Recording collaborators shared by the engine tests

#![allow(dead_code)]

use async_trait::async_trait;
use mp_core::{Command, CommandKind, Key, MemoryDataSource, MouseButton, Point};
use mp_engine::{
    ActionError, ActionExecutor, ElementLocator, Engine, ExecutionContext, LocateError,
    SearchOptions,
};
use mp_script::ScriptDocument;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// One call made to the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click(Point, MouseButton, u8),
    KeyDown(Key),
    KeyUp(Key),
    Text(String),
}

/// Executor that remembers every call
#[derive(Default)]
pub struct RecordingExecutor {
    actions: Mutex<Vec<Action>>,
    /// Text that makes `write_text` fail
    fail_on: Option<String>,
}

impl RecordingExecutor {
    pub fn failing_on(text: &str) -> Self {
        Self {
            fail_on: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: Action) {
        self.actions.lock().unwrap().push(action);
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn move_and_click(
        &self,
        at: Point,
        button: MouseButton,
        clicks: u8,
    ) -> Result<(), ActionError> {
        self.record(Action::Click(at, button, clicks));
        Ok(())
    }

    async fn key_down(&self, key: Key) -> Result<(), ActionError> {
        self.record(Action::KeyDown(key));
        Ok(())
    }

    async fn key_up(&self, key: Key) -> Result<(), ActionError> {
        self.record(Action::KeyUp(key));
        Ok(())
    }

    async fn write_text(&self, text: &str) -> Result<(), ActionError> {
        if self.fail_on.as_deref() == Some(text) {
            return Err(ActionError::new("clipboard unavailable"));
        }
        self.record(Action::Text(text.to_string()));
        Ok(())
    }
}

/// Locator that knows which elements are missing or moved
#[derive(Default)]
pub struct FakeLocator {
    missing: HashSet<String>,
    moved: Option<(String, Point)>,
    calls: Mutex<Vec<String>>,
}

impl FakeLocator {
    pub fn missing(elements: &[&str]) -> Self {
        Self {
            missing: elements.iter().map(|e| e.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn moved(element: &str, to: Point) -> Self {
        Self {
            moved: Some((element.to_string(), to)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ElementLocator for FakeLocator {
    async fn confirm_or_locate(
        &self,
        template: &str,
        at: Point,
        _options: &SearchOptions,
    ) -> Result<Point, LocateError> {
        self.calls.lock().unwrap().push(template.to_string());
        if self.missing.contains(template) {
            return Err(LocateError::ElementNotFound(template.to_string()));
        }
        match &self.moved {
            Some((element, to)) if element == template => Ok(*to),
            _ => Ok(at),
        }
    }
}

/// Engine over the given collaborators, with no pause between commands
pub fn engine(
    executor: Arc<RecordingExecutor>,
    locator: Arc<FakeLocator>,
    source: MemoryDataSource,
) -> Engine {
    let mut engine = Engine::new(executor, locator, Arc::new(source));
    engine.configure(0.0, 1, false, true).unwrap();
    engine
}

/// Document holding the commands in order, pointer before the first
pub fn document(kinds: Vec<CommandKind>) -> ScriptDocument {
    let mut doc = ScriptDocument::new();
    for kind in kinds {
        doc.insert_after_pointer(Command::new(kind)).unwrap();
    }
    doc.set_pointer(None).unwrap();
    doc
}

pub fn context(kinds: Vec<CommandKind>) -> ExecutionContext {
    ExecutionContext::new(document(kinds))
}

pub fn text(s: &str) -> CommandKind {
    CommandKind::WriteText(s.to_string())
}
