//! Script document
//!
//! The document is the ordered execution queue of command ids plus the
//! commands themselves, and the editing pointer. All mutations validate
//! before they touch anything, so a failed call leaves the document as it
//! was.

use crate::error::{DocumentError, DocumentResult};
use crate::labels::LabelRegistry;
use mp_core::{Command, CommandKind, CommandRecord, DataSourceProvider, DecodeScope};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, instrument, trace};

/// Stable identity of a stored command
///
/// Ids are allocated from a per-document counter and never reused, even
/// after the command is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(u64);

impl CommandId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd{}", self.0)
    }
}

/// Ordered queue of commands with a label registry and an editing pointer
#[derive(Debug, Clone, Default)]
pub struct ScriptDocument {
    /// Execution order
    queue: Vec<CommandId>,
    /// Commands by id
    commands: HashMap<CommandId, Command>,
    /// Block and label names
    labels: LabelRegistry,
    /// Selected command; `None` is "before the first command"
    pointer: Option<usize>,
    /// Last allocated id
    last_id: u64,
}

impl ScriptDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from serialized records
    ///
    /// Records are decoded in order against the document being built, so a
    /// duplicate name anywhere in the list fails the whole load. The pointer
    /// is left before the first command.
    pub fn from_records(
        records: &[CommandRecord],
        source: &dyn DataSourceProvider,
    ) -> DocumentResult<Self> {
        let mut doc = Self::new();
        doc.append_records(records, source)?;
        doc.pointer = None;
        Ok(doc)
    }

    // --- Queries ---

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    /// Ids in execution order
    pub fn ids(&self) -> &[CommandId] {
        &self.queue
    }

    pub fn get(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(&id)
    }

    /// Command at a queue position
    pub fn command_at(&self, index: usize) -> Option<(CommandId, &Command)> {
        let id = *self.queue.get(index)?;
        self.commands.get(&id).map(|cmd| (id, cmd))
    }

    /// Queue position of a command
    pub fn position(&self, id: CommandId) -> Option<usize> {
        self.queue.iter().position(|queued| *queued == id)
    }

    /// Commands in execution order
    pub fn iter(&self) -> impl Iterator<Item = (CommandId, &Command)> {
        self.queue
            .iter()
            .filter_map(|id| self.commands.get(id).map(|cmd| (*id, cmd)))
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    /// Queue position of the Block or Label with the given name
    pub fn resolve_label(&self, name: &str) -> Option<usize> {
        self.labels.resolve(name).and_then(|id| self.position(id))
    }

    /// Serialize every command in execution order
    pub fn to_records(&self) -> Vec<CommandRecord> {
        self.iter().map(|(_, cmd)| cmd.encode()).collect()
    }

    /// Scope for decoding a record that will be inserted
    pub fn scope<'a>(&'a self, source: &'a dyn DataSourceProvider) -> EditScope<'a> {
        EditScope {
            labels: &self.labels,
            source,
            replacing: None,
        }
    }

    /// Scope for decoding a record that will replace the command at the pointer
    ///
    /// The replaced command's own name does not count as taken, so a label
    /// can be re-saved under the same name.
    pub fn replace_scope<'a>(&'a self, source: &'a dyn DataSourceProvider) -> EditScope<'a> {
        let replacing = self
            .pointer
            .and_then(|p| self.command_at(p))
            .and_then(|(_, cmd)| cmd.kind.label_name());
        EditScope {
            labels: &self.labels,
            source,
            replacing,
        }
    }

    /// Whether the queue, the lookup table and the label registry agree
    pub fn is_consistent(&self) -> bool {
        let unique: HashSet<_> = self.queue.iter().collect();
        if unique.len() != self.queue.len() || self.queue.len() != self.commands.len() {
            return false;
        }
        if !self.queue.iter().all(|id| self.commands.contains_key(id)) {
            return false;
        }

        let mut names = HashSet::new();
        for (id, cmd) in self.iter() {
            if let Some(name) = cmd.kind.label_name() {
                if !names.insert(name) || self.labels.resolve(name) != Some(id) {
                    return false;
                }
            }
        }
        if names.len() != self.labels.len() {
            return false;
        }

        match self.pointer {
            Some(p) => p < self.queue.len(),
            None => true,
        }
    }

    // --- Mutations ---

    /// Move the editing pointer
    pub fn set_pointer(&mut self, pointer: Option<usize>) -> DocumentResult<()> {
        if let Some(index) = pointer {
            if index >= self.queue.len() {
                return Err(DocumentError::PointerOutOfRange {
                    index,
                    len: self.queue.len(),
                });
            }
        }
        self.pointer = pointer;
        Ok(())
    }

    /// Insert a command right after the pointer and select it
    #[instrument(skip(self, command), fields(kind = command.kind.kind_id()))]
    pub fn insert_after_pointer(&mut self, command: Command) -> DocumentResult<CommandId> {
        command.kind.check()?;
        if let Some(name) = command.kind.label_name() {
            if self.labels.contains(name) {
                return Err(DocumentError::LabelAlreadyExists(name.to_string()));
            }
        }

        Ok(self.insert_unchecked(command))
    }

    /// Decode a record against this document and insert it after the pointer
    pub fn insert_record_after_pointer(
        &mut self,
        record: &CommandRecord,
        source: &dyn DataSourceProvider,
    ) -> DocumentResult<CommandId> {
        let command = Command::decode(record, &self.scope(source))?;
        self.insert_after_pointer(command)
    }

    /// Decode and insert several records after the pointer, all or nothing
    pub fn append_records(
        &mut self,
        records: &[CommandRecord],
        source: &dyn DataSourceProvider,
    ) -> DocumentResult<Vec<CommandId>> {
        let mut staged = self.clone();
        let mut ids = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let command = Command::decode(record, &staged.scope(source))
                .map_err(|source| DocumentError::Decode { index, source })?;
            ids.push(staged.insert_after_pointer(command)?);
        }

        *self = staged;
        debug!(count = ids.len(), "Inserted records");
        Ok(ids)
    }

    /// Replace the command under the pointer, keeping its id
    #[instrument(skip(self, command), fields(kind = command.kind.kind_id()))]
    pub fn replace_at_pointer(&mut self, command: Command) -> DocumentResult<CommandId> {
        let index = self.pointer.ok_or(DocumentError::NoCommandAtPointer)?;
        let id = self.queue[index];

        command.kind.check()?;
        if let Some(name) = command.kind.label_name() {
            if self.labels.taken_by_other(name, Some(id)) {
                return Err(DocumentError::LabelAlreadyExists(name.to_string()));
            }
        }

        let old = self.commands.insert(id, command);
        if let Some(name) = old.as_ref().and_then(|cmd| cmd.kind.label_name()) {
            self.labels.remove(name);
        }
        if let Some(name) = self.commands.get(&id).and_then(|cmd| cmd.kind.label_name()) {
            self.labels.insert(name, id);
        }

        trace!(%id, "Replaced command");
        Ok(id)
    }

    /// Decode a record and replace the command under the pointer with it
    pub fn replace_record_at_pointer(
        &mut self,
        record: &CommandRecord,
        source: &dyn DataSourceProvider,
    ) -> DocumentResult<CommandId> {
        let command = Command::decode(record, &self.replace_scope(source))?;
        self.replace_at_pointer(command)
    }

    /// Remove a command
    ///
    /// The pointer is an index, so removing a command before it leaves the
    /// pointer on the command that followed the one it was on. If the
    /// pointer ends up past the end of the queue it moves to the new last
    /// command, or to `None` when the queue is empty.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: CommandId) -> DocumentResult<Command> {
        let index = self
            .position(id)
            .ok_or(DocumentError::UnknownCommand(id))?;

        self.queue.remove(index);
        let command = self
            .commands
            .remove(&id)
            .ok_or(DocumentError::UnknownCommand(id))?;
        if let Some(name) = command.kind.label_name() {
            self.labels.remove(name);
        }

        if let Some(p) = self.pointer {
            if p >= self.queue.len() {
                self.pointer = self.queue.len().checked_sub(1);
            }
        }

        Ok(command)
    }

    /// Move commands (in the given order) to sit right after `after`
    ///
    /// `None` moves them to the top of the script. Ids are kept and the
    /// pointer ends on the last moved command.
    #[instrument(skip(self, ids))]
    pub fn move_commands(
        &mut self,
        ids: &[CommandId],
        after: Option<CommandId>,
    ) -> DocumentResult<()> {
        let mut seen = HashSet::new();
        for id in ids {
            if !self.commands.contains_key(id) {
                return Err(DocumentError::UnknownCommand(*id));
            }
            if !seen.insert(*id) {
                return Err(DocumentError::InvalidMove(format!("{} listed twice", id)));
            }
        }
        if let Some(anchor) = after {
            if !self.commands.contains_key(&anchor) {
                return Err(DocumentError::UnknownCommand(anchor));
            }
            if seen.contains(&anchor) {
                return Err(DocumentError::InvalidMove(format!(
                    "{} cannot be moved after itself",
                    anchor
                )));
            }
        }
        if ids.is_empty() {
            return Ok(());
        }

        self.queue.retain(|id| !seen.contains(id));
        let start = match after {
            Some(anchor) => self.position(anchor).map_or(0, |p| p + 1),
            None => 0,
        };
        for (offset, id) in ids.iter().enumerate() {
            self.queue.insert(start + offset, *id);
        }
        self.pointer = Some(start + ids.len() - 1);

        debug!(count = ids.len(), start, "Moved commands");
        Ok(())
    }

    /// Paste copies of commands after the pointer
    ///
    /// Copies get new ids. Blocks and labels cannot be copied since their
    /// names would collide; one such command rejects the whole paste.
    #[instrument(skip(self, ids))]
    pub fn insert_copies_after_pointer(
        &mut self,
        ids: &[CommandId],
    ) -> DocumentResult<Vec<CommandId>> {
        let copies = ids
            .iter()
            .map(|id| {
                self.commands
                    .get(id)
                    .cloned()
                    .ok_or(DocumentError::UnknownCommand(*id))
            })
            .collect::<DocumentResult<Vec<_>>>()?;

        if let Some(name) = copies.iter().find_map(|cmd| cmd.kind.label_name()) {
            return Err(DocumentError::LabelAlreadyExists(name.to_string()));
        }

        Ok(copies
            .into_iter()
            .map(|cmd| self.insert_unchecked(cmd))
            .collect())
    }

    /// Remove every command; ids keep counting up
    pub fn clear(&mut self) {
        self.queue.clear();
        self.commands.clear();
        self.labels = LabelRegistry::new();
        self.pointer = None;
    }

    fn insert_unchecked(&mut self, command: Command) -> CommandId {
        self.last_id += 1;
        let id = CommandId(self.last_id);

        if let Some(name) = command.kind.label_name() {
            self.labels.insert(name, id);
        }
        self.commands.insert(id, command);

        let index = self.pointer.map_or(0, |p| p + 1);
        self.queue.insert(index, id);
        self.pointer = Some(index);

        trace!(%id, index, "Inserted command");
        id
    }
}

/// Decode scope backed by a document's registry and a data source
pub struct EditScope<'a> {
    labels: &'a LabelRegistry,
    source: &'a dyn DataSourceProvider,
    replacing: Option<&'a str>,
}

impl DecodeScope for EditScope<'_> {
    fn has_field(&self, field: &str) -> bool {
        self.source.has_field(field)
    }

    fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name) && self.replacing != Some(name)
    }
}

/// Find the command that closes the region opened at `start`
///
/// `Cycle`/`CycleOverField` pair with `CycleEnd` and `Block` with
/// `BlockEnd`, counting nested regions of the same family.
pub fn matching_end(doc: &ScriptDocument, start: usize) -> Option<usize> {
    let (_, opener) = doc.command_at(start)?;
    let is_block = match opener.kind {
        CommandKind::Block(_) => true,
        ref kind if kind.opens_cycle() => false,
        _ => return None,
    };

    let mut depth = 0usize;
    for index in start + 1..doc.len() {
        let (_, cmd) = doc.command_at(index)?;
        let (opens, closes) = if is_block {
            (
                matches!(cmd.kind, CommandKind::Block(_)),
                matches!(cmd.kind, CommandKind::BlockEnd),
            )
        } else {
            (cmd.kind.opens_cycle(), matches!(cmd.kind, CommandKind::CycleEnd))
        };

        if opens {
            depth += 1;
        } else if closes {
            if depth == 0 {
                return Some(index);
            }
            depth -= 1;
        }
    }
    None
}
