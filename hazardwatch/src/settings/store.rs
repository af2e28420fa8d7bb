//! Settings store abstraction.

use std::path::PathBuf;

use parking_lot::RwLock;

use super::{ConfigFile, EngineConfig};

/// Read-only view of the user's alert preferences.
///
/// The engine reads it when monitoring starts; later changes reach the
/// engine through `update_settings`.
pub trait SettingsStore: Send + Sync {
    /// Current settings.
    fn get(&self) -> EngineConfig;
}

/// Settings held in memory, mutable by the settings owner.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    config: RwLock<EngineConfig>,
}

impl InMemorySettingsStore {
    /// Create a store holding `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Replace the stored settings.
    pub fn set(&self, config: EngineConfig) {
        *self.config.write() = config;
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self) -> EngineConfig {
        self.config.read().clone()
    }
}

/// Settings read from an INI file on every `get`.
///
/// A missing or broken file yields the defaults, so a bad edit never stops
/// the engine from starting.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Create a store over the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self) -> EngineConfig {
        if !self.path.exists() {
            return EngineConfig::default();
        }
        match ConfigFile::load(&self.path) {
            Ok(file) => file.engine,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to load settings, using defaults"
                );
                EngineConfig::default()
            }
        }
    }
}
