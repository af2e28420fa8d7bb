//! Init command - write a default configuration file.

use std::path::{Path, PathBuf};

use hazardwatch::settings::{default_config_path, ConfigFile};

use crate::error::CliError;

/// Resolve the target path: explicit `--path`, else `~/.hazardwatch/config.ini`.
fn target_path(path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    path.or_else(default_config_path).ok_or_else(|| {
        CliError::Config("cannot determine home directory; pass --path".to_string())
    })
}

/// Write the default configuration to `path`.
///
/// An existing file is left alone unless `force` is set.
pub fn write_default(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    ConfigFile::default().save(path)?;
    Ok(())
}

/// Run the init command.
pub fn run(path: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let path = target_path(path)?;
    write_default(&path, force)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to change alert distances, categories and voice settings.");
    Ok(())
}
