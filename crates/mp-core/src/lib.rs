//! Core types for macroplay
//!
//! This crate provides the command model shared by the editor and the
//! engine: the closed set of command kinds, the key-name set, error kinds and
//! reactions, the serialized record form, and the data source interface.
//!
//! # Key Types
//!
//! - [`Command`] / [`CommandKind`] - A scripted instruction
//! - [`CommandRecord`] - The serialized `{kind, parameters, description}` form
//! - [`Reaction`] - What to do when an [`ErrorKind`] is raised
//! - [`DataSourceProvider`] - Named fields of values for data-driven loops

mod command;
mod error;
mod key;
mod reaction;
pub mod record;
mod source;

pub use command::{Click, Command, CommandKind, MouseButton, Point, MAX_TEXT_LEN};
pub use error::{DecodeError, DecodeResult, SourceError};
pub use key::{Key, UnknownKey};
pub use reaction::{ErrorKind, Reaction};
pub use record::{CommandRecord, DecodeScope, SimpleScope};
pub use source::{render_value, DataSourceProvider, MemoryDataSource};
