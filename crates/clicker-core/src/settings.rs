//! Persisted user settings
//!
//! Loading never fails: a missing or corrupt file yields the defaults and a
//! malformed field falls back to its own default without affecting the rest.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DELAY_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Delay baked into each newly captured step.
    pub default_delay_ms: u64,
    pub loop_enabled: bool,
    /// Persisted for the editor only; playback loops until cancelled.
    pub loop_count: i64,
    /// Sequence file reopened at startup. Empty when none.
    pub last_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_delay_ms: DEFAULT_DELAY_MS,
            loop_enabled: false,
            loop_count: 1,
            last_file: PathBuf::new(),
        }
    }
}

impl Settings {
    /// `<config dir>/clicker/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("clicker").join("settings.json"))
    }

    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), error = %e, "using default settings");
                } else {
                    tracing::debug!(path = %path.display(), "no settings file, using defaults");
                }
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::SettingsLoad(format!("{}: {}", path.display(), e)))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| Error::SettingsLoad(e.to_string()))?;
        if !value.is_object() {
            return Err(Error::SettingsLoad("expected a JSON object".into()));
        }
        Ok(Self::from_value(&value))
    }

    /// Field-by-field extraction with per-field fallback.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let defaults = Self::default();
        Self {
            default_delay_ms: value
                .get("default_delay_ms")
                .and_then(|v| v.as_u64())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.default_delay_ms),
            loop_enabled: value
                .get("loop_enabled")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.loop_enabled),
            loop_count: value
                .get("loop_count")
                .and_then(|v| v.as_i64())
                .unwrap_or(defaults.loop_count),
            last_file: value
                .get("last_file")
                .and_then(|v| v.as_str())
                .map(PathBuf::from)
                .unwrap_or(defaults.last_file),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Io(e.into()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn last_file(&self) -> Option<&Path> {
        if self.last_file.as_os_str().is_empty() {
            None
        } else {
            Some(&self.last_file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_delay_ms, 300);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{{ nope").unwrap();
        assert!(matches!(Settings::try_load(&path), Err(Error::SettingsLoad(_))));
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn malformed_fields_fall_back_individually() {
        let s = Settings::from_value(&json!({
            "default_delay_ms": "fast",
            "loop_enabled": true,
            "loop_count": 4,
            "last_file": 12
        }));
        assert_eq!(s.default_delay_ms, DEFAULT_DELAY_MS);
        assert!(s.loop_enabled);
        assert_eq!(s.loop_count, 4);
        assert_eq!(s.last_file(), None);
    }

    #[test]
    fn zero_delay_is_not_accepted() {
        let s = Settings::from_value(&json!({"default_delay_ms": 0}));
        assert_eq!(s.default_delay_ms, DEFAULT_DELAY_MS);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            default_delay_ms: 120,
            loop_enabled: true,
            loop_count: 3,
            last_file: PathBuf::from("morning.json"),
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }
}
