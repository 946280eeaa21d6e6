//! Interfaces to the outside world
//!
//! The engine never touches the mouse, the keyboard or the screen itself.
//! Physical effects go through an [`ActionExecutor`]; element checks go
//! through an [`ElementLocator`].

use async_trait::async_trait;
use mp_core::{Key, MouseButton, Point};
use std::time::Duration;
use thiserror::Error;

/// An input action could not be performed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Performs mouse and keyboard actions
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn move_and_click(
        &self,
        at: Point,
        button: MouseButton,
        clicks: u8,
    ) -> Result<(), ActionError>;

    async fn key_down(&self, key: Key) -> Result<(), ActionError>;

    async fn key_up(&self, key: Key) -> Result<(), ActionError>;

    /// Type text in one go (paste-equivalent)
    async fn write_text(&self, text: &str) -> Result<(), ActionError>;
}

/// How hard a locator should look for an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Checks at the recorded position
    pub attempts: u32,
    /// Pause between two checks
    pub backoff: Duration,
    /// Search the whole screen after the last failed check
    pub full_screen: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(1),
            full_screen: true,
        }
    }
}

/// Element lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("element '{0}' not found")]
    ElementNotFound(String),

    #[error("template '{0}' not found")]
    TemplateNotFound(String),
}

/// Confirms that an element is where a click expects it
#[async_trait]
pub trait ElementLocator: Send + Sync {
    /// Return the point to click: `at` when the element is there, or the
    /// element's new position when it moved
    async fn confirm_or_locate(
        &self,
        template: &str,
        at: Point,
        options: &SearchOptions,
    ) -> Result<Point, LocateError>;
}
