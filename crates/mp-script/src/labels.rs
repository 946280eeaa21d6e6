//! Registry of block and label names

use crate::document::CommandId;
use std::collections::BTreeMap;

/// Names of all Block and Label commands in a document
///
/// Names are unique across blocks and labels; the document checks the
/// registry before committing any change that adds or renames one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelRegistry {
    names: BTreeMap<String, CommandId>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Command that owns a name
    pub fn resolve(&self, name: &str) -> Option<CommandId> {
        self.names.get(name).copied()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `name` is taken by a command other than `owner`
    pub(crate) fn taken_by_other(&self, name: &str, owner: Option<CommandId>) -> bool {
        match self.names.get(name) {
            Some(id) => Some(*id) != owner,
            None => false,
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, id: CommandId) {
        self.names.insert(name.into(), id);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.names.remove(name);
    }
}
