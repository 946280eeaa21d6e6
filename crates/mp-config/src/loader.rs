//! YAML settings loader
//!
//! Environment variables can be pulled into any value, either with the
//! `!env_var VAR` tag or with a whole-string `${VAR}` placeholder. The
//! substituted text is re-read as a YAML scalar, so `${PAUSE}` can feed a
//! numeric field.

use crate::error::{ConfigError, ConfigResult};
use crate::settings::PlayerSettings;
use serde_yaml::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, trace};

/// Load settings from a YAML file
pub fn load_settings(path: impl AsRef<Path>) -> ConfigResult<PlayerSettings> {
    let path = path.as_ref();
    debug!("Loading settings file: {:?}", path);

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse(&content, path)
}

/// Load settings, falling back to defaults when the file does not exist
pub fn load_settings_or_default(path: impl AsRef<Path>) -> ConfigResult<PlayerSettings> {
    let path = path.as_ref();
    match load_settings(path) {
        Err(ConfigError::ReadFile { source, .. }) if source.kind() == ErrorKind::NotFound => {
            info!("No settings file at {:?}, using defaults", path);
            Ok(PlayerSettings::default())
        }
        other => other,
    }
}

/// Load settings from a YAML string
pub fn load_settings_string(content: &str) -> ConfigResult<PlayerSettings> {
    parse(content, Path::new("<string>"))
}

fn parse(content: &str, source_path: &Path) -> ConfigResult<PlayerSettings> {
    let parse_err = |e| ConfigError::ParseYaml {
        path: source_path.to_path_buf(),
        source: e,
    };

    let value: Value = serde_yaml::from_str(content).map_err(parse_err)?;
    // An empty file is a document with every default
    let value = match value {
        Value::Null => Value::Mapping(Default::default()),
        other => substitute(other)?,
    };

    let settings: PlayerSettings = serde_yaml::from_value(value).map_err(parse_err)?;
    settings.validate()?;
    Ok(settings)
}

fn substitute(value: Value) -> ConfigResult<Value> {
    match value {
        Value::Tagged(tagged) if tagged.tag == "!env_var" => match tagged.value {
            Value::String(var) => env_scalar(&var),
            _ => Err(ConfigError::InvalidValue {
                key: "!env_var".to_string(),
                reason: "environment variable name must be a string".to_string(),
            }),
        },
        Value::String(s) => match placeholder(&s) {
            Some(var) => env_scalar(var),
            None => Ok(Value::String(s)),
        },
        Value::Mapping(map) => {
            let mut result = serde_yaml::Mapping::new();
            for (k, v) in map {
                result.insert(k, substitute(v)?);
            }
            Ok(Value::Mapping(result))
        }
        Value::Sequence(seq) => Ok(Value::Sequence(
            seq.into_iter().map(substitute).collect::<ConfigResult<_>>()?,
        )),
        other => Ok(other),
    }
}

fn placeholder(s: &str) -> Option<&str> {
    s.strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .filter(|var| !var.is_empty())
}

fn env_scalar(var: &str) -> ConfigResult<Value> {
    let raw = std::env::var(var).map_err(|_| ConfigError::EnvVarNotFound {
        var: var.to_string(),
    })?;
    trace!("Substituted env var: {}", var);

    // Keep the raw text when it does not read as a plain scalar
    Ok(match serde_yaml::from_str::<Value>(&raw) {
        Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => v,
        _ => Value::String(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_placeholder() {
        assert_eq!(placeholder("${HOME}"), Some("HOME"));
        assert_eq!(placeholder("${}"), None);
        assert_eq!(placeholder("prefix ${HOME}"), None);
        assert_eq!(placeholder("plain"), None);
    }

    #[test]
    fn test_empty_document_is_default() {
        let settings = load_settings_string("").unwrap();
        assert_eq!(settings, PlayerSettings::default());
    }

    #[test]
    fn test_partial_document() {
        let settings = load_settings_string("command_pause: 0.1\nsearch_attempts: 5\n").unwrap();
        assert_eq!(settings.command_pause, 0.1);
        assert_eq!(settings.search_attempts, 5);
        assert!(settings.confirm_element);
    }

    #[test]
    fn test_env_placeholder_feeds_numbers() {
        std::env::set_var("MP_CONFIG_TEST_PAUSE", "0.25");
        let settings = load_settings_string("command_pause: ${MP_CONFIG_TEST_PAUSE}\n").unwrap();
        assert_eq!(settings.command_pause, 0.25);
    }

    #[test]
    fn test_env_var_tag() {
        std::env::set_var("MP_CONFIG_TEST_DIR", "/tmp/elements");
        let settings = load_settings_string("elements_dir: !env_var MP_CONFIG_TEST_DIR\n").unwrap();
        assert_eq!(settings.elements_dir, Path::new("/tmp/elements"));
    }

    #[test]
    fn test_missing_env_var() {
        let err = load_settings_string("elements_dir: ${MP_CONFIG_TEST_UNSET_VAR}\n").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { var } if var == "MP_CONFIG_TEST_UNSET_VAR"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = load_settings_string("comand_pause: 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseYaml { .. }));
    }

    #[test]
    fn test_huge_duration_rejected() {
        let err = load_settings_string("command_pause: 1e300\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "command_pause"));
    }

    #[test]
    fn test_negative_pause_rejected() {
        let err = load_settings_string("command_pause: -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "command_pause"));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "full_screen_search: false").unwrap();
        writeln!(file, "start_delay: 0").unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert!(!settings.full_screen_search);
        assert_eq!(settings.start_delay, 0.0);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");

        assert!(matches!(
            load_settings(&path),
            Err(ConfigError::ReadFile { .. })
        ));
        assert_eq!(
            load_settings_or_default(&path).unwrap(),
            PlayerSettings::default()
        );
    }
}
