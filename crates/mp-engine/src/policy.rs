//! Error-reaction table

use mp_core::{ErrorKind, Reaction};
use std::collections::BTreeMap;

/// Reaction chosen for each error kind during a run
///
/// Kinds without an entry react with [`Reaction::Stop`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionTable {
    reactions: BTreeMap<ErrorKind, Reaction>,
}

impl ReactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ErrorKind) -> Reaction {
        self.reactions.get(&kind).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, kind: ErrorKind, reaction: Reaction) {
        self.reactions.insert(kind, reaction);
    }

    /// Back to `Stop` for every kind
    pub fn reset(&mut self) {
        self.reactions.clear();
    }
}
