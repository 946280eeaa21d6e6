//! Player settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Settings that shape how a script is played back
///
/// Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerSettings {
    /// Pause inserted after every executed command
    pub command_pause: f64,
    /// Attempts to confirm an element at its recorded position
    pub search_attempts: u32,
    /// Pause between confirmation attempts
    pub search_backoff: f64,
    /// Search the whole screen once the attempts run out
    pub full_screen_search: bool,
    /// Verify click elements before clicking
    pub confirm_element: bool,
    /// Directory holding element template images
    pub elements_dir: PathBuf,
    /// Delay between pressing play and the first command
    pub start_delay: f64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            command_pause: 0.5,
            search_attempts: 3,
            search_backoff: 1.0,
            full_screen_search: true,
            confirm_element: true,
            elements_dir: PathBuf::from("elements"),
            start_delay: 3.0,
        }
    }
}

impl PlayerSettings {
    /// Check that every duration is finite and non-negative
    pub fn validate(&self) -> ConfigResult<()> {
        for (key, value) in [
            ("command_pause", self.command_pause),
            ("search_backoff", self.search_backoff),
            ("start_delay", self.start_delay),
        ] {
            seconds(key, value)?;
        }
        Ok(())
    }

    pub fn command_pause_duration(&self) -> ConfigResult<Duration> {
        seconds("command_pause", self.command_pause)
    }

    pub fn search_backoff_duration(&self) -> ConfigResult<Duration> {
        seconds("search_backoff", self.search_backoff)
    }

    pub fn start_delay_duration(&self) -> ConfigResult<Duration> {
        seconds("start_delay", self.start_delay)
    }
}

/// Convert a number of seconds into a `Duration`
pub fn seconds(key: &str, value: f64) -> ConfigResult<Duration> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("expected a finite, non-negative number of seconds, got {}", value),
        });
    }
    Duration::try_from_secs_f64(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: format!("{} seconds is out of range: {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.command_pause, 0.5);
        assert_eq!(settings.search_attempts, 3);
        assert_eq!(settings.search_backoff, 1.0);
        assert!(settings.full_screen_search);
        assert!(settings.confirm_element);
        assert_eq!(settings.elements_dir, PathBuf::from("elements"));
        assert_eq!(settings.start_delay, 3.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_durations() {
        let settings = PlayerSettings::default();
        assert_eq!(
            settings.command_pause_duration().unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(settings.start_delay_duration().unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_seconds() {
        assert!(seconds("x", f64::NAN).is_err());
        assert!(seconds("x", f64::INFINITY).is_err());
        assert!(seconds("x", -0.1).is_err());
        assert_eq!(seconds("x", 0.0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_huge_duration_rejected() {
        let err = seconds("command_pause", 1e300).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "command_pause"));

        let settings = PlayerSettings {
            start_delay: f64::MAX,
            ..PlayerSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
