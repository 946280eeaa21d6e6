//! Execution engine for macroplay scripts
//!
//! - [`Engine`]: start / step / stop over an [`ExecutionContext`]
//! - [`DataCursor`] and [`ReactionTable`]: per-run state the commands mutate
//! - [`ActionExecutor`] and [`ElementLocator`]: the engine's view of the screen
//! - [`TemplateLocator`]: retrying locator over a [`TemplateMatcher`]
//! - [`ScriptRunner`]: runs the engine on a background task

mod collaborators;
mod context;
mod cursor;
mod engine;
mod error;
mod locator;
mod policy;
mod runner;

pub use collaborators::{
    ActionError, ActionExecutor, ElementLocator, LocateError, SearchOptions,
};
pub use context::{ExecutionContext, Frame};
pub use cursor::DataCursor;
pub use engine::{Engine, EngineOptions, EngineState, Step};
pub use error::{EngineError, EngineResult, Fault};
pub use locator::{Match, TemplateLocator, TemplateMatcher};
pub use policy::ReactionTable;
pub use runner::{RunOutcome, RunReport, ScriptRunner, StopHandle};
