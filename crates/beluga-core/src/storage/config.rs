//! TOML-based application configuration.
//!
//! Stores:
//! - Phase lengths for the Beluga technique (in minutes)
//! - Deep-focus unlock probability and optional RNG seed
//! - Whether `start` enters the three-cycle auto-run
//! - Web dashboard bind address and broadcast cadence
//!
//! Configuration is stored at `~/.config/beluga/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timer::TimerSettings;

/// Timer configuration. Durations are whole minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u64,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u64,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u64,
    #[serde(default = "default_micro_break_minutes")]
    pub micro_break_minutes: u64,
    #[serde(default = "default_deep_focus_minutes")]
    pub deep_focus_minutes: u64,
    #[serde(default = "default_cycles_before_long_break")]
    pub cycles_before_long_break: u32,
    #[serde(default = "default_deep_focus_probability")]
    pub deep_focus_probability: f64,
    /// `start` enters the three-cycle auto-run instead of a single phase.
    #[serde(default)]
    pub auto_run: bool,
    /// Fixed seed for deep-focus draws. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Web dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_broadcast_interval_ms")]
    pub broadcast_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/beluga/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

// Default functions
fn default_focus_minutes() -> u64 {
    30
}
fn default_short_break_minutes() -> u64 {
    7
}
fn default_long_break_minutes() -> u64 {
    20
}
fn default_micro_break_minutes() -> u64 {
    2
}
fn default_deep_focus_minutes() -> u64 {
    45
}
fn default_cycles_before_long_break() -> u32 {
    3
}
fn default_deep_focus_probability() -> f64 {
    0.4
}
fn default_bind() -> String {
    "127.0.0.1:5000".into()
}
fn default_broadcast_interval_ms() -> u64 {
    1000
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            micro_break_minutes: default_micro_break_minutes(),
            deep_focus_minutes: default_deep_focus_minutes(),
            cycles_before_long_break: default_cycles_before_long_break(),
            deep_focus_probability: default_deep_focus_probability(),
            auto_run: false,
            seed: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            broadcast_interval_ms: default_broadcast_interval_ms(),
        }
    }
}

/// Optional keys that `set` clears when given "none".
const NULLABLE_KEYS: &[&str] = &["timer.seed"];

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl TimerConfig {
    /// Check every value and convert minutes to the engine's seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero duration, zero
    /// cycles, or a probability outside `0.0..=1.0`.
    pub fn settings(&self) -> Result<TimerSettings, ConfigError> {
        let minutes = [
            ("timer.focus_minutes", self.focus_minutes),
            ("timer.short_break_minutes", self.short_break_minutes),
            ("timer.long_break_minutes", self.long_break_minutes),
            ("timer.micro_break_minutes", self.micro_break_minutes),
            ("timer.deep_focus_minutes", self.deep_focus_minutes),
        ];
        for (key, value) in minutes {
            if value == 0 {
                return Err(invalid(key, "duration must be at least one minute"));
            }
        }
        let settings = TimerSettings {
            focus_secs: self.focus_minutes.saturating_mul(60),
            short_break_secs: self.short_break_minutes.saturating_mul(60),
            long_break_secs: self.long_break_minutes.saturating_mul(60),
            micro_break_secs: self.micro_break_minutes.saturating_mul(60),
            deep_focus_secs: self.deep_focus_minutes.saturating_mul(60),
            cycles_before_long_break: self.cycles_before_long_break,
            deep_focus_probability: self.deep_focus_probability,
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl ServerConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the interval is zero.
    pub fn broadcast_interval(&self) -> Result<Duration, ConfigError> {
        if self.broadcast_interval_ms == 0 {
            return Err(invalid(
                "server.broadcast_interval_ms",
                "interval must be positive",
            ));
        }
        Ok(Duration::from_millis(self.broadcast_interval_ms))
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                _ if NULLABLE_KEYS.contains(&key) && value.eq_ignore_ascii_case("none") => {
                    serde_json::Value::Null
                }
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(key, e.to_string()))?,
                serde_json::Value::Number(_) => parse_number(key, value)?,
                // Unset optional field; all of them are numbers.
                serde_json::Value::Null => parse_number(key, value)?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid(key, "cannot overwrite a section"));
                }
                serde_json::Value::String(_) => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the config file inside [`data_dir`].
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| {
                    ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check every section without converting anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timer.settings()?;
        self.server.broadcast_interval()?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key.
    ///
    /// The change is validated before it is applied; `self` is untouched on
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not parse, or
    /// the resulting configuration fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<serde_json::Value, ConfigError> {
    if let Ok(n) = value.parse::<u64>() {
        return Ok(serde_json::Value::Number(n.into()));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .ok_or_else(|| invalid(key, format!("cannot parse '{value}' as number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_beluga_technique() {
        let settings = TimerConfig::default().settings().unwrap();
        assert_eq!(settings.focus_secs, 30 * 60);
        assert_eq!(settings.short_break_secs, 7 * 60);
        assert_eq!(settings.long_break_secs, 20 * 60);
        assert_eq!(settings.micro_break_secs, 2 * 60);
        assert_eq!(settings.deep_focus_secs, 45 * 60);
        assert_eq!(settings.cycles_before_long_break, 3);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let cfg = TimerConfig {
            short_break_minutes: 0,
            ..TimerConfig::default()
        };
        let err = cfg.settings().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "timer.short_break_minutes")
        );
    }

    #[test]
    fn zero_cycles_and_bad_probability_are_rejected() {
        let cfg = TimerConfig {
            cycles_before_long_break: 0,
            ..TimerConfig::default()
        };
        assert!(cfg.settings().is_err());

        let cfg = TimerConfig {
            deep_focus_probability: 1.5,
            ..TimerConfig::default()
        };
        assert!(cfg.settings().is_err());
    }

    #[test]
    fn get_and_set_by_dotted_key() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get("timer.focus_minutes").as_deref(), Some("30"));

        cfg.set("timer.focus_minutes", "25").unwrap();
        cfg.set("timer.auto_run", "true").unwrap();
        cfg.set("server.bind", "0.0.0.0:8080").unwrap();
        cfg.set("timer.seed", "7").unwrap();

        assert_eq!(cfg.timer.focus_minutes, 25);
        assert!(cfg.timer.auto_run);
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.timer.seed, Some(7));

        cfg.set("timer.seed", "none").unwrap();
        assert_eq!(cfg.timer.seed, None);
        cfg.set("timer.seed", "NONE").unwrap();
        assert_eq!(cfg.timer.seed, None);
    }

    #[test]
    fn none_only_clears_optional_keys() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.focus_minutes", "none").is_err());
        assert!(cfg.set("server.bind", "none").is_ok());
        assert_eq!(cfg.server.bind, "none");
        assert_eq!(cfg.timer.focus_minutes, 30);
    }

    #[test]
    fn set_rejects_unknown_and_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.nope", "1").is_err());
        assert!(cfg.set("timer", "1").is_err());
        assert!(cfg.set("timer.focus_minutes", "0").is_err());
        assert!(cfg.set("timer.focus_minutes", "abc").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.timer.long_break_minutes = 25;
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), changed);
    }

    #[test]
    fn partial_file_uses_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timer]\nfocus_minutes = 1\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.timer.focus_minutes, 1);
        assert_eq!(cfg.timer.short_break_minutes, 7);
        assert_eq!(cfg.server, ServerConfig::default());
    }

    #[test]
    fn malformed_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timer\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
