//! Script commands
//!
//! Every scripted instruction is a [`Command`]: a closed [`CommandKind`] with
//! its typed parameters, plus a free-form user description. Commands are
//! plain values; identity is assigned by the document that stores them.

use crate::error::{DecodeError, DecodeResult};
use crate::key::Key;
use crate::reaction::{ErrorKind, Reaction};
use crate::record::{self, CommandRecord, DecodeScope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters a `WriteText` command may type
pub const MAX_TEXT_LEN: usize = 50;

/// A screen position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Mouse button used by a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
}

/// Parameters of the click commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Click {
    pub x: i32,
    pub y: i32,

    /// Template of the element expected under the pointer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl Click {
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            element: None,
        }
    }

    /// Require the given element template to be visible before clicking
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// The closed set of command kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    ClickLeft(Click),
    ClickRight(Click),
    ClickDouble(Click),
    KeyDown(Key),
    KeyUp(Key),
    /// Type a short text (pasted in one go)
    WriteText(String),
    /// Blocking delay in whole seconds
    Pause(u64),
    /// Call a block or a label
    Run(String),
    /// Change the reaction to an error kind from this point of the run
    ErrorReaction { error: ErrorKind, reaction: Reaction },
    /// Type the value under the field's read cursor
    WriteFieldValue(String),
    /// Move the field's read cursor one value forward
    NextElementField(String),
    /// Loop until the field's values are exhausted
    CycleOverField(String),
    /// Repeat the body a fixed number of times
    Cycle(u32),
    /// Closes `Cycle` and `CycleOverField`
    CycleEnd,
    /// Start of a named subroutine
    Block(String),
    BlockEnd,
    /// Named jump target
    Label(String),
    Stop,
}

impl CommandKind {
    /// Stable identifier used in serialized scripts
    pub fn kind_id(&self) -> &'static str {
        match self {
            CommandKind::ClickLeft(_) => "click_left",
            CommandKind::ClickRight(_) => "click_right",
            CommandKind::ClickDouble(_) => "click_double",
            CommandKind::KeyDown(_) => "key_down",
            CommandKind::KeyUp(_) => "key_up",
            CommandKind::WriteText(_) => "write_text",
            CommandKind::Pause(_) => "pause",
            CommandKind::Run(_) => "run",
            CommandKind::ErrorReaction { .. } => "error_reaction",
            CommandKind::WriteFieldValue(_) => "write_field_value",
            CommandKind::NextElementField(_) => "next_element_field",
            CommandKind::CycleOverField(_) => "cycle_over_field",
            CommandKind::Cycle(_) => "cycle",
            CommandKind::CycleEnd => "cycle_end",
            CommandKind::Block(_) => "block",
            CommandKind::BlockEnd => "block_end",
            CommandKind::Label(_) => "label",
            CommandKind::Stop => "stop",
        }
    }

    /// Name registered in the label registry (blocks and labels only)
    pub fn label_name(&self) -> Option<&str> {
        match self {
            CommandKind::Block(name) | CommandKind::Label(name) => Some(name),
            _ => None,
        }
    }

    /// Data field referenced by the command
    pub fn field(&self) -> Option<&str> {
        match self {
            CommandKind::WriteFieldValue(field)
            | CommandKind::NextElementField(field)
            | CommandKind::CycleOverField(field) => Some(field),
            _ => None,
        }
    }

    /// Whether the command opens a region closed by `CycleEnd`
    pub fn opens_cycle(&self) -> bool {
        matches!(self, CommandKind::Cycle(_) | CommandKind::CycleOverField(_))
    }

    /// Checks that do not depend on the surrounding document
    pub fn check(&self) -> DecodeResult<()> {
        match self {
            CommandKind::WriteText(text) => {
                let len = text.chars().count();
                if len > MAX_TEXT_LEN {
                    return Err(DecodeError::TextTooLong {
                        len,
                        max: MAX_TEXT_LEN,
                    });
                }
            }
            CommandKind::Run(name)
            | CommandKind::Block(name)
            | CommandKind::Label(name)
            | CommandKind::WriteFieldValue(name)
            | CommandKind::NextElementField(name)
            | CommandKind::CycleOverField(name) => {
                if name.trim().is_empty() {
                    return Err(DecodeError::InvalidParameters {
                        kind: self.kind_id().to_string(),
                        reason: "name must not be empty".to_string(),
                    });
                }
            }
            CommandKind::ErrorReaction { reaction, .. } => {
                if reaction.target().is_some_and(|t| t.trim().is_empty()) {
                    return Err(DecodeError::InvalidParameters {
                        kind: self.kind_id().to_string(),
                        reason: "reaction target must not be empty".to_string(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Full validation against the data source and the label registry
    pub fn validate(&self, scope: &dyn DecodeScope) -> DecodeResult<()> {
        self.check()?;

        if let Some(field) = self.field() {
            if !scope.has_field(field) {
                return Err(DecodeError::UnknownField(field.to_string()));
            }
        }

        if let Some(name) = self.label_name() {
            if scope.has_label(name) {
                return Err(DecodeError::LabelAlreadyExists(name.to_string()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::ClickLeft(c) => write!(f, "Left click at {}", c.point()),
            CommandKind::ClickRight(c) => write!(f, "Right click at {}", c.point()),
            CommandKind::ClickDouble(c) => write!(f, "Double click at {}", c.point()),
            CommandKind::KeyDown(key) => write!(f, "Key down {}", key),
            CommandKind::KeyUp(key) => write!(f, "Key up {}", key),
            CommandKind::WriteText(text) => write!(f, "Write {:?}", text),
            CommandKind::Pause(secs) => write!(f, "Pause {}s", secs),
            CommandKind::Run(target) => write!(f, "Run {}", target),
            CommandKind::ErrorReaction { error, reaction } => {
                write!(f, "On {}: {}", error, reaction)
            }
            CommandKind::WriteFieldValue(field) => write!(f, "Write field {}", field),
            CommandKind::NextElementField(field) => write!(f, "Next element of {}", field),
            CommandKind::CycleOverField(field) => write!(f, "Cycle over field {}", field),
            CommandKind::Cycle(count) => write!(f, "Cycle {} times", count),
            CommandKind::CycleEnd => f.write_str("End of cycle"),
            CommandKind::Block(name) => write!(f, "Block {}", name),
            CommandKind::BlockEnd => f.write_str("End of block"),
            CommandKind::Label(name) => write!(f, "Label {}", name),
            CommandKind::Stop => f.write_str("Stop"),
        }
    }
}

/// A scripted instruction with its user description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub description: String,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Serialize into the `{kind, parameters, description}` record form
    pub fn encode(&self) -> CommandRecord {
        record::encode(self)
    }

    /// Build a command from a record, validating it against `scope`
    pub fn decode(record: &CommandRecord, scope: &dyn DecodeScope) -> DecodeResult<Self> {
        record::decode(record, scope)
    }
}

impl From<CommandKind> for Command {
    fn from(kind: CommandKind) -> Self {
        Command::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SimpleScope;

    #[test]
    fn test_write_text_length_limit() {
        let ok = CommandKind::WriteText("x".repeat(MAX_TEXT_LEN));
        assert!(ok.check().is_ok());

        let too_long = CommandKind::WriteText("x".repeat(MAX_TEXT_LEN + 1));
        assert_eq!(
            too_long.check(),
            Err(DecodeError::TextTooLong { len: 51, max: 50 })
        );
    }

    #[test]
    fn test_text_limit_counts_characters() {
        // 50 Cyrillic letters are 100 bytes but still within the limit
        let text = "я".repeat(MAX_TEXT_LEN);
        assert!(CommandKind::WriteText(text).check().is_ok());
    }

    #[test]
    fn test_validate_field_reference() {
        let scope = SimpleScope::new().with_fields(["age"]);
        assert!(CommandKind::WriteFieldValue("age".into())
            .validate(&scope)
            .is_ok());
        assert_eq!(
            CommandKind::NextElementField("name".into()).validate(&scope),
            Err(DecodeError::UnknownField("name".into()))
        );
    }

    #[test]
    fn test_validate_label_collision() {
        let scope = SimpleScope::new().with_labels(["start"]);
        assert_eq!(
            CommandKind::Block("start".into()).validate(&scope),
            Err(DecodeError::LabelAlreadyExists("start".into()))
        );
        // Run only references a name, it does not register one
        assert!(CommandKind::Run("start".into()).validate(&scope).is_ok());
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(matches!(
            CommandKind::Label("  ".into()).check(),
            Err(DecodeError::InvalidParameters { .. })
        ));
        assert!(matches!(
            CommandKind::ErrorReaction {
                error: ErrorKind::FieldExhausted,
                reaction: Reaction::GotoLabel(String::new()),
            }
            .check(),
            Err(DecodeError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_display() {
        let cmd = CommandKind::ClickLeft(Click::at(10, 20));
        assert_eq!(cmd.to_string(), "Left click at (10, 20)");
        assert_eq!(CommandKind::Cycle(3).to_string(), "Cycle 3 times");
    }
}
