//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default rest target and set count
//! - Warning thresholds and reconciliation behavior
//! - Target adjustment step and floor
//! - History capacity
//! - Custom presets
//!
//! Configuration is stored at `~/.config/resttimer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};
use crate::timer::{Preset, TimerSettings, DEFAULT_HISTORY_CAPACITY};

/// Session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_target_secs")]
    pub default_target_secs: u32,
    #[serde(default = "default_min_target_secs")]
    pub min_target_secs: u32,
    #[serde(default = "default_total_sets")]
    pub default_total_sets: u32,
}

/// Remaining-time warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningsConfig {
    #[serde(default = "default_thresholds")]
    pub thresholds_secs: Vec<u32>,
    /// Announce thresholds jumped over when time spent suspended is added back.
    #[serde(default = "default_true")]
    pub fire_skipped_on_reconcile: bool,
}

/// The +/- buttons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustConfig {
    #[serde(default = "default_adjust_step")]
    pub step_secs: u32,
    /// Adjustments never take the target below this.
    #[serde(default = "default_adjust_floor")]
    pub floor_secs: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/resttimer/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Label used when a rest is started without one.
    #[serde(default = "default_exercise")]
    pub default_exercise: String,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub warnings: WarningsConfig,
    #[serde(default)]
    pub adjust: AdjustConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    /// Listed after the built-in presets.
    #[serde(default)]
    pub custom_presets: Vec<Preset>,
}

fn default_target_secs() -> u32 {
    90
}
fn default_min_target_secs() -> u32 {
    1
}
fn default_total_sets() -> u32 {
    3
}
fn default_thresholds() -> Vec<u32> {
    vec![30, 10]
}
fn default_true() -> bool {
    true
}
fn default_adjust_step() -> u32 {
    15
}
fn default_adjust_floor() -> u32 {
    15
}
fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}
fn default_exercise() -> String {
    "Rest".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_target_secs: default_target_secs(),
            min_target_secs: default_min_target_secs(),
            default_total_sets: default_total_sets(),
        }
    }
}

impl Default for WarningsConfig {
    fn default() -> Self {
        Self {
            thresholds_secs: default_thresholds(),
            fire_skipped_on_reconcile: true,
        }
    }
}

impl Default for AdjustConfig {
    fn default() -> Self {
        Self {
            step_secs: default_adjust_step(),
            floor_secs: default_adjust_floor(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_exercise: default_exercise(),
            timer: TimerConfig::default(),
            warnings: WarningsConfig::default(),
            adjust: AdjustConfig::default(),
            history: HistoryConfig::default(),
            custom_presets: Vec::new(),
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

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
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
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(e.to_string()))?,
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load and validate a config file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
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

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Update a value by dot-separated key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |field: &str, message: &str| ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.to_string(),
        };
        if self.timer.default_target_secs == 0 {
            return Err(invalid("timer.default_target_secs", "must be positive"));
        }
        if self.timer.default_total_sets == 0 {
            return Err(invalid("timer.default_total_sets", "must be positive"));
        }
        if self.warnings.thresholds_secs.contains(&0) {
            return Err(invalid("warnings.thresholds_secs", "thresholds must be positive"));
        }
        if self.history.capacity == 0 {
            return Err(invalid("history.capacity", "must be positive"));
        }
        if let Some(p) = self.custom_presets.iter().find(|p| p.target_secs == 0) {
            return Err(invalid(
                "custom_presets",
                &format!("preset '{}' has a zero target", p.name),
            ));
        }
        Ok(())
    }

    /// Built-in presets followed by custom ones.
    pub fn presets(&self) -> Vec<Preset> {
        let mut presets = Preset::builtin();
        presets.extend(self.custom_presets.iter().cloned());
        presets
    }

    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            default_target_secs: self.timer.default_target_secs,
            min_target_secs: self.timer.min_target_secs,
            default_total_sets: self.timer.default_total_sets,
            warning_thresholds_secs: self.warnings.thresholds_secs.clone(),
            fire_skipped_on_reconcile: self.warnings.fire_skipped_on_reconcile,
            history_capacity: self.history.capacity,
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.default_target_secs, 90);
        assert_eq!(parsed.warnings.thresholds_secs, vec![30, 10]);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[adjust]\nfloor_secs = 30\n").unwrap();
        assert_eq!(parsed.adjust.floor_secs, 30);
        assert_eq!(parsed.adjust.step_secs, 15);
        assert_eq!(parsed.history.capacity, 10);
        assert_eq!(parsed.default_exercise, "Rest");
    }

    #[test]
    fn custom_presets_parse_from_toml() {
        let parsed: Config = toml::from_str(
            r#"
            [[custom_presets]]
            name = "Tabata"
            target_secs = 10
            "#,
        )
        .unwrap();
        let presets = parsed.presets();
        assert_eq!(presets.len(), Preset::builtin().len() + 1);
        assert_eq!(Preset::find(&presets, "tabata").unwrap().target_secs, 10);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.default_target_secs").as_deref(), Some("90"));
        assert_eq!(cfg.get("warnings.thresholds_secs").as_deref(), Some("[30,10]"));
        assert_eq!(cfg.get("default_exercise").as_deref(), Some("Rest"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_value_updates_nested_fields() {
        let mut cfg = Config::default();
        cfg.set_value("adjust.floor_secs", "30").unwrap();
        cfg.set_value("warnings.fire_skipped_on_reconcile", "false").unwrap();
        cfg.set_value("warnings.thresholds_secs", "[60, 15]").unwrap();
        cfg.set_value("default_exercise", "Squat").unwrap();
        assert_eq!(cfg.adjust.floor_secs, 30);
        assert!(!cfg.warnings.fire_skipped_on_reconcile);
        assert_eq!(cfg.warnings.thresholds_secs, vec![60, 15]);
        assert_eq!(cfg.default_exercise, "Squat");
    }

    #[test]
    fn set_value_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set_value("timer.nonexistent", "1").unwrap_err();
        assert!(matches!(err, crate::CoreError::Config(ConfigError::UnknownKey(_))));
        assert!(cfg.set_value("", "1").is_err());
    }

    #[test]
    fn set_value_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("warnings.fire_skipped_on_reconcile", "maybe").is_err());
        assert!(cfg.set_value("timer.default_target_secs", "-5").is_err());
    }

    #[test]
    fn set_value_rejects_invalid_config_and_keeps_old() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("history.capacity", "0").is_err());
        assert!(cfg.set_value("warnings.thresholds_secs", "[10, 0]").is_err());
        assert_eq!(cfg.history.capacity, 10);
        assert_eq!(cfg.warnings.thresholds_secs, vec![30, 10]);
    }

    #[test]
    fn timer_settings_normalizes_thresholds() {
        let mut cfg = Config::default();
        cfg.warnings.thresholds_secs = vec![5, 20, 5];
        let settings = cfg.timer_settings();
        assert_eq!(settings.warning_thresholds_secs, vec![20, 5]);
        assert_eq!(settings.history_capacity, 10);
    }

    #[test]
    fn save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.timer.default_target_secs = 120;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.timer.default_target_secs, 120);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = 7").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(crate::CoreError::Config(ConfigError::ParseFailed(_)))
        ));
    }
}
