//! Per-field read positions over data source values

use crate::error::Fault;
use serde_json::Value;
use std::collections::HashMap;

/// Read position of every field referenced during a run
///
/// A field starts at position 0 the first time it is read. Positions are
/// independent per field and survive loop iterations.
#[derive(Debug, Clone, Default)]
pub struct DataCursor {
    positions: HashMap<String, usize>,
}

impl DataCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current read position of a field
    pub fn position(&self, field: &str) -> usize {
        self.positions.get(field).copied().unwrap_or(0)
    }

    /// Value under the cursor, without moving it
    pub fn peek<'a>(&self, field: &str, values: &'a [Value]) -> Result<&'a Value, Fault> {
        values
            .get(self.position(field))
            .ok_or_else(|| Fault::FieldExhausted {
                field: field.to_string(),
            })
    }

    /// Whether a value remains under the cursor
    pub fn has_more(&self, field: &str, len: usize) -> bool {
        self.position(field) < len
    }

    /// Move the cursor one value forward and return the new position
    ///
    /// Stepping off the last value is allowed; stepping further is not.
    pub fn advance(&mut self, field: &str, len: usize) -> Result<usize, Fault> {
        let position = self.position(field);
        if position >= len {
            return Err(Fault::FieldExhausted {
                field: field.to_string(),
            });
        }
        self.positions.insert(field.to_string(), position + 1);
        Ok(position + 1)
    }

    pub fn reset(&mut self) {
        self.positions.clear();
    }
}
