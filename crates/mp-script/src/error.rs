//! Error types for document editing and script files

use crate::document::CommandId;
use mp_core::DecodeError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised by document mutations
///
/// Every failing operation leaves the document exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("label or block '{0}' already exists")]
    LabelAlreadyExists(String),

    #[error("command {0} not found")]
    UnknownCommand(CommandId),

    #[error("no command at the pointer")]
    NoCommandAtPointer,

    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("pointer {index} is out of range for {len} commands")]
    PointerOutOfRange { index: usize, len: usize },

    #[error("invalid command: {0}")]
    Invalid(#[source] DecodeError),

    #[error("record {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: DecodeError,
    },
}

impl From<DecodeError> for DocumentError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::LabelAlreadyExists(name) => DocumentError::LabelAlreadyExists(name),
            other => DocumentError::Invalid(other),
        }
    }
}

/// Errors raised while loading or saving script files
#[derive(Debug, Error)]
pub enum ScriptFileError {
    #[error("failed to read script {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write script {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse script: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to serialize script: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),
}
