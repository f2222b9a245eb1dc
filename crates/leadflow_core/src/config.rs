//! Organization-level lifecycle configuration.
//!
//! # Invariants
//! - `default_max_call_attempts >= 1`.
//! - Follow-up labels are non-blank single lines.

use chrono_tz::Tz;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub const DEFAULT_MAX_CALL_ATTEMPTS: u32 = 3;
pub const DEFAULT_CALL_AGAIN_LABEL: &str = "Opnieuw bellen";
pub const DEFAULT_STILL_THINKING_LABEL: &str = "KS twijfel - Opvolging";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Settings shared by every lifecycle service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Organization time zone used for displayed timestamps and defaults.
    pub timezone: Tz,
    /// Ceiling used when a lead has no team or the team leaves it unset.
    pub default_max_call_attempts: u32,
    pub call_again_label: String,
    pub still_thinking_label: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Brussels,
            default_max_call_attempts: DEFAULT_MAX_CALL_ATTEMPTS,
            call_again_label: DEFAULT_CALL_AGAIN_LABEL.to_string(),
            still_thinking_label: DEFAULT_STILL_THINKING_LABEL.to_string(),
        }
    }
}

impl LifecycleConfig {
    /// Parses and validates a JSON config document. Missing keys use defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_call_attempts == 0 {
            return Err(ConfigError::Invalid(
                "default_max_call_attempts must be at least 1".to_string(),
            ));
        }
        for (key, label) in [
            ("call_again_label", &self.call_again_label),
            ("still_thinking_label", &self.still_thinking_label),
        ] {
            if label.trim().is_empty() || label.contains(['\n', '\r']) {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be a non-blank single line"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, LifecycleConfig};

    #[test]
    fn empty_document_yields_defaults() {
        let config = LifecycleConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LifecycleConfig::default());
        assert_eq!(config.timezone, chrono_tz::Europe::Brussels);
        assert_eq!(config.default_max_call_attempts, 3);
    }

    #[test]
    fn overrides_are_applied() {
        let config = LifecycleConfig::from_json_str(
            r#"{"timezone":"Europe/Amsterdam","default_max_call_attempts":5}"#,
        )
        .unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::Amsterdam);
        assert_eq!(config.default_max_call_attempts, 5);
        assert_eq!(config.call_again_label, "Opnieuw bellen");
    }

    #[test]
    fn zero_ceiling_and_unknown_zone_are_rejected() {
        let err = LifecycleConfig::from_json_str(r#"{"default_max_call_attempts":0}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = LifecycleConfig::from_json_str(r#"{"timezone":"Mars/Olympus"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
