//! Engine errors

use crate::collaborators::ActionError;
use mp_core::ErrorKind;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Conditions raised while running a command that the script's
/// error-reaction policy decides about
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("field '{field}' has no more values")]
    FieldExhausted { field: String },

    #[error("field '{field}' is not in the data source")]
    UnknownField { field: String },

    #[error("element '{element}' not found on screen")]
    ElementNotFound { element: String },

    #[error("no template image for element '{element}'")]
    TemplateNotFound { element: String },
}

impl Fault {
    /// The policy entry that handles this fault
    pub fn kind(&self) -> ErrorKind {
        match self {
            Fault::FieldExhausted { .. } | Fault::UnknownField { .. } => ErrorKind::FieldExhausted,
            Fault::ElementNotFound { .. } | Fault::TemplateNotFound { .. } => {
                ErrorKind::ElementNotFound
            }
        }
    }
}

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("action failed at command {index}: {source}")]
    ActionFailed {
        index: usize,
        #[source]
        source: ActionError,
    },

    #[error("command {index}: no label or block named '{name}'")]
    UnknownTarget { index: usize, name: String },

    #[error("command {index}: end marker without a matching open region")]
    UnbalancedEnd { index: usize },

    #[error("command {index}: region is never closed")]
    Unclosed { index: usize },

    #[error("invalid setting: {0}")]
    Config(#[from] mp_config::ConfigError),

    #[error("command {index}: {fault}")]
    Fault {
        index: usize,
        #[source]
        fault: Fault,
    },

    #[error("run task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
