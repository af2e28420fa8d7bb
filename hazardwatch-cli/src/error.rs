//! CLI error type and exit codes.

use std::fmt;
use std::path::{Path, PathBuf};

use hazardwatch::alert::CatalogError;
use hazardwatch::geo::GeoError;
use hazardwatch::settings::ConfigError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or catalog problem.
    Config(String),
    /// An input file could not be read or decoded.
    Input { path: PathBuf, message: String },
    /// A coordinate given on the command line is out of range.
    Coordinate(GeoError),
    /// The async runtime could not be started.
    Runtime(String),
    /// Location permission was refused by the position source.
    PermissionDenied,
}

impl CliError {
    pub fn input(path: &Path, message: impl fmt::Display) -> Self {
        CliError::Input {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Process exit code, following sysexits.h.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Coordinate(_) | CliError::Input { .. } => 65,
            CliError::Runtime(_) => 70,
            CliError::PermissionDenied => 77,
            CliError::Config(_) => 78,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Input { path, message } => {
                write!(f, "Cannot use {}: {}", path.display(), message)
            }
            CliError::Coordinate(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::PermissionDenied => write!(f, "Location permission denied"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Config(format!("alert catalog: {}", e))
    }
}

impl From<GeoError> for CliError {
    fn from(e: GeoError) -> Self {
        CliError::Coordinate(e)
    }
}
