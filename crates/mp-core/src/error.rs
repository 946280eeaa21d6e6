//! Error types for building commands and loading data sources

use std::path::PathBuf;
use thiserror::Error;

/// Result type for command decoding and validation
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while turning a record into a command
///
/// A decode error never leaves partial state behind: nothing is added to a
/// document until the whole command has been decoded and validated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown command kind: {0}")]
    UnknownCommandKind(String),

    #[error("invalid parameters for '{kind}': {reason}")]
    InvalidParameters { kind: String, reason: String },

    #[error("invalid key name: {0}")]
    InvalidKeyName(String),

    #[error("text is {len} characters long, the limit is {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("no field '{0}' in the data source")]
    UnknownField(String),

    #[error("label or block '{0}' already exists")]
    LabelAlreadyExists(String),
}

/// Errors raised while loading a data source file
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read data source {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse data source: {0}")]
    Parse(#[from] serde_yaml::Error),
}
