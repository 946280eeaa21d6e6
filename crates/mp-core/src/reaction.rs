//! Error kinds and the reactions a script can choose for them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime conditions that are handled by the script's error-reaction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The element expected at a click position is not on screen
    ElementNotFound,
    /// A data field has no value at the read position
    FieldExhausted,
}

impl ErrorKind {
    /// All error kinds, in a stable order
    pub const ALL: [ErrorKind; 2] = [ErrorKind::ElementNotFound, ErrorKind::FieldExhausted];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ElementNotFound => "element_not_found",
            ErrorKind::FieldExhausted => "field_exhausted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the engine does when an error of a given kind is raised
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    /// Stop the run with an error
    #[default]
    Stop,
    /// Skip the failed command and continue
    Ignore,
    /// Continue at the named label
    GotoLabel(String),
    /// Call the named block, then resume after the failed command
    RunBlock(String),
}

impl Reaction {
    /// Name of the jump target, if the reaction redirects execution
    pub fn target(&self) -> Option<&str> {
        match self {
            Reaction::GotoLabel(name) | Reaction::RunBlock(name) => Some(name),
            Reaction::Stop | Reaction::Ignore => None,
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reaction::Stop => f.write_str("stop"),
            Reaction::Ignore => f.write_str("ignore"),
            Reaction::GotoLabel(name) => write!(f, "goto label '{}'", name),
            Reaction::RunBlock(name) => write!(f, "run block '{}'", name),
        }
    }
}
