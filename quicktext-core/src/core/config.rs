//! Engine wiring configuration.

use std::time::Duration;

use crate::core::excel::ImportLimits;
use crate::core::paths::AppPaths;

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(600);
pub const DEFAULT_SETTINGS_SAVE_DELAY: Duration = Duration::from_millis(700);

/// Where the engine keeps its files and how eagerly it saves them.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub paths: AppPaths,
    /// Quiet period after the last library change before it is written.
    pub autosave_delay: Duration,
    pub settings_save_delay: Duration,
    pub import_limits: ImportLimits,
}

impl EngineConfig {
    /// Default delays and limits, with all files under `root`.
    pub fn at(root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            paths: AppPaths::at(root),
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            paths: AppPaths::default(),
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            settings_save_delay: DEFAULT_SETTINGS_SAVE_DELAY,
            import_limits: ImportLimits::default(),
        }
    }
}
