//! Script documents for macroplay
//!
//! This crate holds the editable form of a script: the ordered command queue
//! with stable ids, the registry of block and label names, and the script
//! file format.
//!
//! # Key Types
//!
//! - [`ScriptDocument`] - Command queue, lookup table and editing pointer
//! - [`LabelRegistry`] - Unique block and label names
//! - [`ScriptFile`] - Serialized script with metadata

pub mod document;
mod error;
mod labels;
pub mod script;

pub use document::{matching_end, CommandId, EditScope, ScriptDocument};
pub use error::{DocumentError, DocumentResult, ScriptFileError};
pub use labels::LabelRegistry;
pub use script::ScriptFile;
