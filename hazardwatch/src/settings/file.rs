//! INI configuration file.
//!
//! ```ini
//! [alerts]
//! inner_distance_m = 200
//! reset_margin_m = 100
//! refresh_radius_m = 1000
//! cooldown_secs = 5
//!
//! [categories]
//! pothole = true
//! accident = true
//! speed_camera = true
//! public_service = true
//! other = true
//!
//! [voice]
//! sound = true
//! language = en
//! volume = 1.0
//! catalog = /path/to/messages.json
//!
//! [repository]
//! base_url = https://api.example.com
//! auth_token = ...
//! timeout_secs = 10
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::EngineConfig;
use crate::hazard::{HazardCategory, HttpRepositoryConfig};

const SECTION_ALERTS: &str = "alerts";
const SECTION_CATEGORIES: &str = "categories";
const SECTION_VOICE: &str = "voice";
const SECTION_REPOSITORY: &str = "repository";

/// Errors that can occur while loading or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid INI.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A key holds a value of the wrong shape.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Engine settings.
    pub engine: EngineConfig,
    /// Hazard feed settings, if a `[repository]` base URL is configured.
    pub repository: Option<HttpRepositoryConfig>,
    /// Alert message catalog override.
    pub catalog_path: Option<PathBuf>,
}

/// Default location of the config file (`~/.hazardwatch/config.ini`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".hazardwatch").join("config.ini"))
}

impl ConfigFile {
    /// Load from an INI file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(io) => ConfigError::Io(io),
            ini::Error::Parse(p) => ConfigError::Parse(p.to_string()),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut engine = EngineConfig::default();

        if let Some(v) = parse_key::<f64>(ini, SECTION_ALERTS, "inner_distance_m")? {
            engine.inner_distance_m = non_negative(SECTION_ALERTS, "inner_distance_m", v)?;
        }
        if let Some(v) = parse_key::<f64>(ini, SECTION_ALERTS, "reset_margin_m")? {
            engine.reset_margin_m = non_negative(SECTION_ALERTS, "reset_margin_m", v)?;
        }
        if let Some(v) = parse_key::<f64>(ini, SECTION_ALERTS, "refresh_radius_m")? {
            engine.refresh_radius_m = non_negative(SECTION_ALERTS, "refresh_radius_m", v)?;
        }
        if let Some(v) = parse_key::<f64>(ini, SECTION_ALERTS, "cooldown_secs")? {
            engine.cooldown = parse_cooldown(non_negative(SECTION_ALERTS, "cooldown_secs", v)?)?;
        }

        for category in HazardCategory::ALL {
            if let Some(enabled) = parse_key::<bool>(ini, SECTION_CATEGORIES, category.as_str())? {
                engine.categories.set(category, enabled);
            }
        }

        if let Some(v) = parse_key::<bool>(ini, SECTION_VOICE, "sound")? {
            engine.sound_enabled = v;
        }
        if let Some(v) = get_key(ini, SECTION_VOICE, "language") {
            engine.language = v.to_string();
        }
        if let Some(v) = parse_key::<f32>(ini, SECTION_VOICE, "volume")? {
            engine = engine.with_volume(v);
        }
        let catalog_path = get_key(ini, SECTION_VOICE, "catalog").map(PathBuf::from);

        let repository = match get_key(ini, SECTION_REPOSITORY, "base_url") {
            Some(url) => {
                let mut repo = HttpRepositoryConfig::new(url);
                if let Some(token) = get_key(ini, SECTION_REPOSITORY, "auth_token") {
                    repo = repo.with_auth_token(token);
                }
                if let Some(secs) = parse_key::<u64>(ini, SECTION_REPOSITORY, "timeout_secs")? {
                    repo = repo.with_timeout(Duration::from_secs(secs));
                }
                Some(repo)
            }
            None => None,
        };

        Ok(Self {
            engine,
            repository,
            catalog_path,
        })
    }

    /// Render as INI.
    pub fn to_ini(&self) -> Ini {
        let e = &self.engine;
        let mut ini = Ini::new();

        ini.with_section(Some(SECTION_ALERTS))
            .set("inner_distance_m", e.inner_distance_m.to_string())
            .set("reset_margin_m", e.reset_margin_m.to_string())
            .set("refresh_radius_m", e.refresh_radius_m.to_string())
            .set("cooldown_secs", e.cooldown.as_secs_f64().to_string());

        for (category, enabled) in e.categories.iter() {
            ini.with_section(Some(SECTION_CATEGORIES))
                .set(category.as_str(), enabled.to_string());
        }

        ini.with_section(Some(SECTION_VOICE))
            .set("sound", e.sound_enabled.to_string())
            .set("language", e.language.clone())
            .set("volume", e.volume.to_string());
        if let Some(path) = &self.catalog_path {
            ini.with_section(Some(SECTION_VOICE))
                .set("catalog", path.display().to_string());
        }

        if let Some(repo) = &self.repository {
            ini.with_section(Some(SECTION_REPOSITORY))
                .set("base_url", repo.base_url.clone())
                .set("timeout_secs", repo.timeout.as_secs().to_string());
            if let Some(token) = &repo.auth_token {
                ini.with_section(Some(SECTION_REPOSITORY))
                    .set("auth_token", token.clone());
            }
        }

        ini
    }

    /// Write to an INI file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        Ok(())
    }
}

fn get_key<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.section(Some(section))
        .and_then(|s| s.get(key))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_key<T: FromStr>(ini: &Ini, section: &str, key: &str) -> Result<Option<T>, ConfigError> {
    match get_key(ini, section, key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: format!("{}.{}", section, key),
                value: raw.to_string(),
            }),
        None => Ok(None),
    }
}

fn non_negative(section: &str, key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key: format!("{}.{}", section, key),
            value: value.to_string(),
        })
    }
}

fn parse_cooldown(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidValue {
        key: format!("{}.cooldown_secs", SECTION_ALERTS),
        value: secs.to_string(),
    })
}
