//! Serialized command records
//!
//! Scripts are stored as an ordered list of `{kind, parameters, description}`
//! records. Decoding goes through a static registry keyed by the stable kind
//! identifier; each entry turns the parameter object into a typed
//! [`CommandKind`].

use crate::command::{Click, Command, CommandKind};
use crate::error::{DecodeError, DecodeResult};
use crate::key::Key;
use crate::reaction::{ErrorKind, Reaction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::trace;

/// A command in its serialized form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Stable kind identifier (e.g. "click_left")
    pub kind: String,

    /// Kind-specific parameters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,

    /// User description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl CommandRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            parameters: Map::new(),
            description: String::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// What a record is decoded against
///
/// Field references must exist in the data source and Block/Label names must
/// not already be registered.
pub trait DecodeScope {
    fn has_field(&self, field: &str) -> bool;
    fn has_label(&self, name: &str) -> bool;
}

/// A scope built from explicit name sets
#[derive(Debug, Clone, Default)]
pub struct SimpleScope {
    fields: BTreeSet<String>,
    labels: BTreeSet<String>,
}

impl SimpleScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }
}

impl DecodeScope for SimpleScope {
    fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }
}

// --- Parameter shapes ---

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyParams {
    key: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TextParams {
    text: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PauseParams {
    seconds: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetParams {
    target: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReactionParams {
    error: ErrorKind,
    reaction: Reaction,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldParams {
    field: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct NameParams {
    name: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CountParams {
    count: u32,
}

// --- Registry ---

type DecodeFn = fn(&str, Map<String, Value>) -> DecodeResult<CommandKind>;

/// One entry of the kind registry
struct KindEntry {
    id: &'static str,
    decode: DecodeFn,
}

static REGISTRY: &[KindEntry] = &[
    KindEntry { id: "click_left", decode: decode_click_left },
    KindEntry { id: "click_right", decode: decode_click_right },
    KindEntry { id: "click_double", decode: decode_click_double },
    KindEntry { id: "key_down", decode: decode_key_down },
    KindEntry { id: "key_up", decode: decode_key_up },
    KindEntry { id: "write_text", decode: decode_write_text },
    KindEntry { id: "pause", decode: decode_pause },
    KindEntry { id: "run", decode: decode_run },
    KindEntry { id: "error_reaction", decode: decode_error_reaction },
    KindEntry { id: "write_field_value", decode: decode_write_field_value },
    KindEntry { id: "next_element_field", decode: decode_next_element_field },
    KindEntry { id: "cycle_over_field", decode: decode_cycle_over_field },
    KindEntry { id: "cycle", decode: decode_cycle },
    KindEntry { id: "cycle_end", decode: decode_cycle_end },
    KindEntry { id: "block", decode: decode_block },
    KindEntry { id: "block_end", decode: decode_block_end },
    KindEntry { id: "label", decode: decode_label },
    KindEntry { id: "stop", decode: decode_stop },
];

/// Identifiers of every registered command kind
pub fn kind_ids() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|entry| entry.id)
}

/// Decode a record into a command, validating it against `scope`
pub fn decode(record: &CommandRecord, scope: &dyn DecodeScope) -> DecodeResult<Command> {
    let entry = REGISTRY
        .iter()
        .find(|entry| entry.id == record.kind)
        .ok_or_else(|| DecodeError::UnknownCommandKind(record.kind.clone()))?;

    trace!(kind = entry.id, "Decoding command record");

    let kind = (entry.decode)(entry.id, record.parameters.clone())?;
    kind.validate(scope)?;

    Ok(Command {
        kind,
        description: record.description.clone(),
    })
}

/// Encode a command into its record form
pub fn encode(command: &Command) -> CommandRecord {
    let parameters = match &command.kind {
        CommandKind::ClickLeft(click)
        | CommandKind::ClickRight(click)
        | CommandKind::ClickDouble(click) => to_params(click),
        CommandKind::KeyDown(key) | CommandKind::KeyUp(key) => to_params(KeyParams {
            key: key.as_str().to_string(),
        }),
        CommandKind::WriteText(text) => to_params(TextParams { text: text.clone() }),
        CommandKind::Pause(seconds) => to_params(PauseParams { seconds: *seconds }),
        CommandKind::Run(target) => to_params(TargetParams {
            target: target.clone(),
        }),
        CommandKind::ErrorReaction { error, reaction } => to_params(ReactionParams {
            error: *error,
            reaction: reaction.clone(),
        }),
        CommandKind::WriteFieldValue(field)
        | CommandKind::NextElementField(field)
        | CommandKind::CycleOverField(field) => to_params(FieldParams {
            field: field.clone(),
        }),
        CommandKind::Cycle(count) => to_params(CountParams { count: *count }),
        CommandKind::Block(name) | CommandKind::Label(name) => {
            to_params(NameParams { name: name.clone() })
        }
        CommandKind::CycleEnd | CommandKind::BlockEnd | CommandKind::Stop => Map::new(),
    };

    CommandRecord {
        kind: command.kind.kind_id().to_string(),
        parameters,
        description: command.description.clone(),
    }
}

fn to_params<T: Serialize>(params: T) -> Map<String, Value> {
    match serde_json::to_value(params) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn from_params<T: DeserializeOwned>(kind: &str, parameters: Map<String, Value>) -> DecodeResult<T> {
    serde_json::from_value(Value::Object(parameters)).map_err(|e| DecodeError::InvalidParameters {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

fn no_params(kind: &str, parameters: &Map<String, Value>) -> DecodeResult<()> {
    if parameters.is_empty() {
        Ok(())
    } else {
        Err(DecodeError::InvalidParameters {
            kind: kind.to_string(),
            reason: "this command takes no parameters".to_string(),
        })
    }
}

fn parse_key(kind: &str, parameters: Map<String, Value>) -> DecodeResult<Key> {
    let params: KeyParams = from_params(kind, parameters)?;
    params
        .key
        .parse()
        .map_err(|_| DecodeError::InvalidKeyName(params.key))
}

fn decode_click_left(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<Click>(kind, p).map(CommandKind::ClickLeft)
}

fn decode_click_right(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<Click>(kind, p).map(CommandKind::ClickRight)
}

fn decode_click_double(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<Click>(kind, p).map(CommandKind::ClickDouble)
}

fn decode_key_down(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    parse_key(kind, p).map(CommandKind::KeyDown)
}

fn decode_key_up(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    parse_key(kind, p).map(CommandKind::KeyUp)
}

fn decode_write_text(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<TextParams>(kind, p).map(|p| CommandKind::WriteText(p.text))
}

fn decode_pause(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<PauseParams>(kind, p).map(|p| CommandKind::Pause(p.seconds))
}

fn decode_run(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<TargetParams>(kind, p).map(|p| CommandKind::Run(p.target))
}

fn decode_error_reaction(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<ReactionParams>(kind, p).map(|p| CommandKind::ErrorReaction {
        error: p.error,
        reaction: p.reaction,
    })
}

fn decode_write_field_value(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<FieldParams>(kind, p).map(|p| CommandKind::WriteFieldValue(p.field))
}

fn decode_next_element_field(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<FieldParams>(kind, p).map(|p| CommandKind::NextElementField(p.field))
}

fn decode_cycle_over_field(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<FieldParams>(kind, p).map(|p| CommandKind::CycleOverField(p.field))
}

fn decode_cycle(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<CountParams>(kind, p).map(|p| CommandKind::Cycle(p.count))
}

fn decode_cycle_end(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    no_params(kind, &p).map(|_| CommandKind::CycleEnd)
}

fn decode_block(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<NameParams>(kind, p).map(|p| CommandKind::Block(p.name))
}

fn decode_block_end(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    no_params(kind, &p).map(|_| CommandKind::BlockEnd)
}

fn decode_label(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    from_params::<NameParams>(kind, p).map(|p| CommandKind::Label(p.name))
}

fn decode_stop(kind: &str, p: Map<String, Value>) -> DecodeResult<CommandKind> {
    no_params(kind, &p).map(|_| CommandKind::Stop)
}
