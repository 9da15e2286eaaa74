//! Locations of the files QuickText keeps per user.

use std::path::{Path, PathBuf};

/// Name of the per-user application data folder.
pub const APP_FOLDER_NAME: &str = "LookrQuickText";

/// Resolved set of per-user file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Uses the platform's local application data directory.
    ///
    /// - Linux: `~/.local/share/LookrQuickText`
    /// - macOS: `~/Library/Application Support/LookrQuickText`
    /// - Windows: `%LOCALAPPDATA%\LookrQuickText`
    pub fn default_location() -> Self {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join(APP_FOLDER_NAME))
    }

    /// Keeps every file under `root`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snippets_file(&self) -> PathBuf {
        self.root.join("snippets.bin")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    pub fn vault_key_file(&self) -> PathBuf {
        self.root.join("vault.key")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::default_location()
    }
}
