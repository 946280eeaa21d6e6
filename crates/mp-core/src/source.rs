//! Data sources
//!
//! A data source is a set of named fields (table columns), each holding an
//! ordered sequence of values. Where the values come from is up to the
//! provider; the engine only reads them through [`DataSourceProvider`].

use crate::error::SourceError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Supplies field names and their values to the editor and the engine
pub trait DataSourceProvider: Send + Sync {
    /// Names of all fields, in column order
    fn fields(&self) -> Vec<String>;

    /// Values of a field, or `None` if the field does not exist
    fn values_for(&self, field: &str) -> Option<&[Value]>;

    fn has_field(&self, field: &str) -> bool {
        self.values_for(field).is_some()
    }
}

/// A data source held in memory, keeping column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryDataSource {
    columns: IndexMap<String, Vec<Value>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a column
    pub fn with_field<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.insert(field, values.into_iter().map(Into::into).collect());
        self
    }

    /// Insert or replace a column
    pub fn insert(&mut self, field: impl Into<String>, values: Vec<Value>) {
        self.columns.insert(field.into(), values);
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Parse a `field: [values]` mapping (YAML or JSON)
    pub fn from_yaml_str(content: &str) -> Result<Self, SourceError> {
        let columns: IndexMap<String, Vec<Value>> = serde_yaml::from_str(content)?;
        Ok(Self { columns })
    }

    /// Load a `field: [values]` mapping from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        debug!("Loading data source: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| SourceError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }
}

impl DataSourceProvider for MemoryDataSource {
    fn fields(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    fn values_for(&self, field: &str) -> Option<&[Value]> {
        self.columns.get(field).map(Vec::as_slice)
    }
}

/// Render a data value as the text that gets typed
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
