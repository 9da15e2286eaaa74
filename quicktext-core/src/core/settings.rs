//! Application settings persistence.
//!
//! Stores the local AI configuration in a plain JSON file next to the
//! snippet vault. A missing or corrupt file silently yields defaults; the
//! reason is kept for the status bar.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::ai::{AiRuntimeSettings, MAX_TOKENS_RANGE, TEMPERATURE_RANGE};
use crate::core::paths::AppPaths;
use crate::core::store::write_atomically;
use crate::Result;

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Path to the llama.cpp-compatible CLI executable.
    pub ai_executable_path: String,
    /// Path to the GGUF model file.
    pub ai_model_path: String,
    pub ai_temperature: f64,
    pub ai_max_tokens: i64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            ai_executable_path: String::new(),
            ai_model_path: String::new(),
            ai_temperature: 0.7,
            ai_max_tokens: 220,
        }
    }
}

impl AppSettings {
    /// Returns a copy with temperature and token count forced into their allowed ranges.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.ai_temperature = clamp_temperature(self.ai_temperature);
        self.ai_max_tokens = clamp_max_tokens(self.ai_max_tokens);
        self
    }

    /// The runtime view handed to the AI orchestrator.
    pub fn ai_runtime(&self) -> AiRuntimeSettings {
        AiRuntimeSettings {
            executable_path: PathBuf::from(&self.ai_executable_path),
            model_path: PathBuf::from(&self.ai_model_path),
            temperature: self.ai_temperature,
            max_tokens: self.ai_max_tokens,
        }
    }
}

pub fn clamp_temperature(value: f64) -> f64 {
    if value.is_nan() {
        return *TEMPERATURE_RANGE.start();
    }
    value.clamp(*TEMPERATURE_RANGE.start(), *TEMPERATURE_RANGE.end())
}

pub fn clamp_max_tokens(value: i64) -> i64 {
    value.clamp(*MAX_TOKENS_RANGE.start(), *MAX_TOKENS_RANGE.end())
}

/// Reads and writes [`AppSettings`] at a fixed path.
pub struct SettingsStore {
    path: PathBuf,
    last_load_error: Mutex<Option<String>>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_load_error: Mutex::new(None),
        }
    }

    pub fn open_default(paths: &AppPaths) -> Self {
        Self::new(paths.settings_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The reason the last [`load`](Self::load) fell back to defaults, if it did.
    pub fn last_load_error(&self) -> Option<String> {
        self.last_load_error.lock().ok().and_then(|g| g.clone())
    }

    /// Loads settings from disk; returns defaults if the file is missing or corrupt.
    pub fn load(&self) -> AppSettings {
        let (settings, error) = match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => (AppSettings::default(), None),
            Ok(content) => match serde_json::from_str::<AppSettings>(&content) {
                Ok(settings) => (settings.clamped(), None),
                Err(e) => {
                    log::warn!("settings file {} is corrupt: {e}", self.path.display());
                    (
                        AppSettings::default(),
                        Some("Settings file was unreadable; using defaults.".to_string()),
                    )
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (AppSettings::default(), None),
            Err(e) => {
                log::warn!("failed to read settings {}: {e}", self.path.display());
                let message = if e.kind() == std::io::ErrorKind::PermissionDenied {
                    "Permission issue while reading app settings; using defaults.".to_string()
                } else {
                    "Could not read app settings; using defaults.".to_string()
                };
                (AppSettings::default(), Some(message))
            }
        };

        if let Ok(mut last) = self.last_load_error.lock() {
            *last = error;
        }
        settings
    }

    /// Saves settings to disk atomically, creating parent directories as needed.
    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        write_atomically(&self.path, json.as_bytes())?;
        log::debug!("saved settings to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load(), AppSettings::default());
        assert!(store.last_load_error().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));
        let settings = AppSettings {
            ai_executable_path: "/opt/llama/llama-cli".to_string(),
            ai_model_path: "/models/tiny.gguf".to_string(),
            ai_temperature: 0.4,
            ai_max_tokens: 512,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"aiExecutablePath\""));
        assert!(raw.contains("\"aiMaxTokens\": 512"));
    }

    #[test]
    fn test_corrupt_file_yields_defaults_with_diagnostic() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        fs::write(store.path(), "{ nope").unwrap();
        assert_eq!(store.load(), AppSettings::default());
        assert!(store.last_load_error().is_some());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_keys() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        fs::write(store.path(), r#"{"aiModelPath":"m.gguf"}"#).unwrap();
        let loaded = store.load();
        assert_eq!(loaded.ai_model_path, "m.gguf");
        assert_eq!(loaded.ai_max_tokens, 220);
    }

    #[test]
    fn test_out_of_range_values_are_clamped_on_load() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        fs::write(store.path(), r#"{"aiTemperature":9.0,"aiMaxTokens":5}"#).unwrap();
        let loaded = store.load();
        assert_eq!(loaded.ai_temperature, 1.5);
        assert_eq!(loaded.ai_max_tokens, 64);
    }

    #[test]
    fn test_clamp_helpers() {
        assert_eq!(clamp_temperature(0.0), 0.1);
        assert_eq!(clamp_temperature(f64::NAN), 0.1);
        assert_eq!(clamp_max_tokens(5000), 1024);
        assert_eq!(clamp_max_tokens(300), 300);
    }
}
