//! Script files
//!
//! A script file holds the serialized command sequence plus a little
//! metadata. YAML and JSON are both accepted on load; files are written as
//! YAML.

use crate::document::ScriptDocument;
use crate::error::ScriptFileError;
use mp_core::{CommandRecord, DataSourceProvider};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Script file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptFile {
    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Command records in execution order
    #[serde(default)]
    pub sequence: Vec<CommandRecord>,
}

impl ScriptFile {
    /// Snapshot a document
    pub fn from_document(alias: Option<String>, doc: &ScriptDocument) -> Self {
        Self {
            alias,
            description: None,
            sequence: doc.to_records(),
        }
    }

    /// Display name, falling back to `fallback`
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.alias.as_deref().unwrap_or(fallback)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ScriptFileError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ScriptFileError> {
        serde_yaml::to_string(self).map_err(ScriptFileError::Serialize)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptFileError> {
        let path = path.as_ref();
        debug!("Loading script file: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| ScriptFileError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScriptFileError> {
        let path = path.as_ref();
        let content = self.to_yaml_string()?;

        fs::write(path, content).map_err(|e| ScriptFileError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(commands = self.sequence.len(), "Saved script to {:?}", path);
        Ok(())
    }

    /// Decode the sequence into a document
    pub fn to_document(
        &self,
        source: &dyn DataSourceProvider,
    ) -> Result<ScriptDocument, ScriptFileError> {
        Ok(ScriptDocument::from_records(&self.sequence, source)?)
    }
}
