//! Collaborators for replaying a script without touching the desktop

use async_trait::async_trait;
use mp_core::{Key, MouseButton, Point};
use mp_engine::{ActionError, ActionExecutor, Match, TemplateMatcher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Executor that logs every action instead of performing it
#[derive(Debug, Default)]
pub struct LoggingExecutor {
    actions: AtomicUsize,
}

impl LoggingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions logged so far
    pub fn actions(&self) -> usize {
        self.actions.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.actions.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ActionExecutor for LoggingExecutor {
    async fn move_and_click(
        &self,
        at: Point,
        button: MouseButton,
        clicks: u8,
    ) -> Result<(), ActionError> {
        self.count();
        info!(?button, clicks, "click at {}", at);
        Ok(())
    }

    async fn key_down(&self, key: Key) -> Result<(), ActionError> {
        self.count();
        info!(key = key.as_str(), "key down");
        Ok(())
    }

    async fn key_up(&self, key: Key) -> Result<(), ActionError> {
        self.count();
        info!(key = key.as_str(), "key up");
        Ok(())
    }

    async fn write_text(&self, text: &str) -> Result<(), ActionError> {
        self.count();
        info!(text, "write text");
        Ok(())
    }
}

/// Matcher that only checks template files exist
///
/// Every existing template is considered visible where it was recorded.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    dir: PathBuf,
}

impl FileMatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TemplateMatcher for FileMatcher {
    fn has_template(&self, template: &str) -> bool {
        self.dir.join(template).is_file()
    }

    fn matches_near(&self, _template: &str, _at: Point) -> bool {
        true
    }

    fn find_on_screen(&self, _template: &str) -> Option<Match> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_engine::{ElementLocator, LocateError, SearchOptions, TemplateLocator};

    #[tokio::test]
    async fn test_logging_executor_counts() {
        let executor = LoggingExecutor::new();
        executor
            .move_and_click(Point::new(1, 2), MouseButton::Left, 2)
            .await
            .unwrap();
        executor.key_down(Key::Enter).await.unwrap();
        executor.write_text("hello").await.unwrap();
        assert_eq!(executor.actions(), 3);
    }

    #[tokio::test]
    async fn test_file_matcher_locator() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.png"), b"png").unwrap();
        let locator = TemplateLocator::new(FileMatcher::new(dir.path()));
        let at = Point::new(3, 4);
        let options = SearchOptions::default();

        assert_eq!(locator.confirm_or_locate("ok.png", at, &options).await, Ok(at));
        assert_eq!(
            locator.confirm_or_locate("gone.png", at, &options).await,
            Err(LocateError::TemplateNotFound("gone.png".to_string()))
        );
    }
}
