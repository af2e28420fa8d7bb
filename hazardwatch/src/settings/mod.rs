//! User alert preferences.
//!
//! - [`EngineConfig`] - values the engine reads on every check cycle
//! - [`EngineConfigPatch`] - partial update applied by `update_settings`
//! - [`SettingsStore`] - where the initial values come from
//! - [`ConfigFile`] - the INI file backing [`FileSettingsStore`]

mod config;
mod file;
mod store;

pub use config::{
    CategoryToggles, EngineConfig, EngineConfigPatch, DEFAULT_COOLDOWN, DEFAULT_INNER_DISTANCE_M,
    DEFAULT_LANGUAGE, DEFAULT_REFRESH_RADIUS_M, DEFAULT_RESET_MARGIN_M,
};
pub use file::{default_config_path, ConfigError, ConfigFile};
pub use store::{FileSettingsStore, InMemorySettingsStore, SettingsStore};
