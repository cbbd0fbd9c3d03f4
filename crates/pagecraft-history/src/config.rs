#![forbid(unsafe_code)]

//! Configuration for the [`Historian`](crate::Historian).
//!
//! ```toml
//! # history.toml
//! size = 200
//! epoch_ms = 400
//! ```
//!
//! ```rust,ignore
//! let config = HistoryConfig::from_toml_file("history.toml")?;
//! let config = HistoryConfig::from_json_str(r#"{"size": 50}"#)?;
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for history recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Slot count of the almanac. One slot is the floor, so `size - 1`
    /// steps are undoable.
    pub size: usize,

    /// Window of the implicit auto-transaction. `None` disables epochs.
    #[serde(rename = "epoch_ms", with = "epoch_ms")]
    pub epoch: Option<Duration>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            size: 100,
            epoch: None,
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self { size, epoch: None }
    }

    /// Coalesce bursts of edits made within `window` into one undo step.
    #[must_use]
    pub fn with_epoch(mut self, window: Duration) -> Self {
        self.epoch = Some(window);
        self
    }

    /// Effectively unbounded history (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(1 << 20)
    }

    /// Returns a list of problems; empty means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.size < 2 {
            errors.push(format!(
                "size must be at least 2 to allow one undo step, got {}",
                self.size
            ));
        }
        if self.epoch == Some(Duration::ZERO) {
            errors.push("epoch_ms must be positive when set".to_string());
        }
        errors
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)?.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)?.validated()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

mod epoch_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            // Saturate rather than wrap for epochs past u64 milliseconds.
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = HistoryConfig::default();
        assert_eq!(config.size, 100);
        assert_eq!(config.epoch, None);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn validate_catches_tiny_size_and_zero_epoch() {
        let config = HistoryConfig::new(1).with_epoch(Duration::ZERO);
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn json_partial_override_preserves_defaults() {
        let config = HistoryConfig::from_json_str(r#"{"epoch_ms": 250}"#).unwrap();
        assert_eq!(config.size, 100);
        assert_eq!(config.epoch, Some(Duration::from_millis(250)));
    }

    #[test]
    fn json_rejects_invalid() {
        let err = HistoryConfig::from_json_str(r#"{"size": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref e) if e.len() == 1));
        assert!(err.to_string().contains("size must be at least 2"));
    }

    #[test]
    fn json_round_trip() {
        let config = HistoryConfig::new(12).with_epoch(Duration::from_millis(40));
        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains("\"epoch_ms\":40"));
        assert_eq!(HistoryConfig::from_json_str(&text).unwrap(), config);
    }

    #[test]
    fn oversized_epoch_saturates() {
        let config = HistoryConfig::new(4).with_epoch(Duration::MAX);
        let text = serde_json::to_value(&config).unwrap();
        assert_eq!(text["epoch_ms"], serde_json::json!(u64::MAX));
        let back: HistoryConfig = serde_json::from_value(text).unwrap();
        assert_eq!(back.epoch, Some(Duration::from_millis(u64::MAX)));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn toml_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.toml");
        std::fs::write(&path, "size = 8\nepoch_ms = 300\n").unwrap();
        let config = HistoryConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.size, 8);
        assert_eq!(config.epoch, Some(Duration::from_millis(300)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = HistoryConfig::from_json_file("/nonexistent/pagecraft/history.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
