//! TOML-based application configuration.
//!
//! Stores:
//! - Backend endpoint and public API key
//! - Reminder lead times and the weekly goal
//! - Notification preferences
//! - The app origin the delivery worker routes clicks to
//!
//! Configuration is stored at `~/.config/aayra/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::reminder::{SchedulerConfig, DEFAULT_LEAD_MINUTES};
use crate::stats::DEFAULT_WEEKLY_GOAL;

/// Managed backend connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: Option<String>,
    /// Public (anon) API key sent as `apikey`.
    #[serde(default)]
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_lead_minutes")]
    pub lead_minutes: u32,
    #[serde(default)]
    pub follow_up_lead_minutes: Option<u32>,
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal: u32,
    /// How often the service loop checks for due reminders.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_icon")]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_app_origin")]
    pub app_origin: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/aayra/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Keys that read as `none` when unset and accept `none` to clear.
const OPTIONAL_STRING_KEYS: &[&str] = &["backend.url", "backend.anon_key"];
const OPTIONAL_NUMBER_KEYS: &[&str] = &["reminders.follow_up_lead_minutes"];

fn default_lead_minutes() -> u32 {
    DEFAULT_LEAD_MINUTES
}
fn default_weekly_goal() -> u32 {
    DEFAULT_WEEKLY_GOAL
}
fn default_tick_interval_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_icon() -> String {
    crate::notify::DEFAULT_ICON.into()
}
fn default_app_origin() -> String {
    "http://localhost:8080".into()
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            lead_minutes: default_lead_minutes(),
            follow_up_lead_minutes: None,
            weekly_goal: default_weekly_goal(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

impl RemindersConfig {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            lead_minutes: self.lead_minutes,
            follow_up_lead_minutes: self.follow_up_lead_minutes,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            icon: default_icon(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            app_origin: default_app_origin(),
        }
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

    fn parse_number(key: &str, value: &str) -> Result<serde_json::Value, ConfigError> {
        if let Ok(n) = value.parse::<u64>() {
            return Ok(serde_json::Value::Number(n.into()));
        }
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse '{value}' as number"),
            })
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let (parent, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent) = parent {
            for part in parent.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => {
                serde_json::Value::Bool(value.parse::<bool>().map_err(|e| {
                    ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: e.to_string(),
                    }
                })?)
            }
            serde_json::Value::Number(_) => {
                if value.eq_ignore_ascii_case("none") && Self::is_optional(key) {
                    serde_json::Value::Null
                } else {
                    Self::parse_number(key, value)?
                }
            }
            serde_json::Value::Null => {
                if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    serde_json::Value::Null
                } else if OPTIONAL_NUMBER_KEYS.contains(&key) {
                    Self::parse_number(key, value)?
                } else {
                    serde_json::Value::String(value.into())
                }
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "not a leaf value".into(),
                })
            }
            serde_json::Value::String(_) => {
                if value.eq_ignore_ascii_case("none") && Self::is_optional(key) {
                    serde_json::Value::Null
                } else {
                    serde_json::Value::String(value.into())
                }
            }
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn is_optional(key: &str) -> bool {
        OPTIONAL_STRING_KEYS.contains(&key) || OPTIONAL_NUMBER_KEYS.contains(&key)
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    /// Unset optional values read as `none`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some("none".to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}
