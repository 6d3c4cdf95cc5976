//! Locating and reading `sol.toml`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;
use super::validation::validate_config;

pub const CONFIG_FILE_NAME: &str = "sol.toml";

/// Path of the configuration file, honoring a `--config` directory.
pub fn get_config_path(config_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = config_dir {
        return Ok(dir.join(CONFIG_FILE_NAME));
    }
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("sol").join(CONFIG_FILE_NAME))
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// Returns the config and the path it was read from, if any. A custom
/// directory without a `sol.toml` is an error, since the user asked for it.
pub fn load(config_dir: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    let path = get_config_path(config_dir)?;

    if !path.exists() {
        if config_dir.is_some() {
            anyhow::bail!("Configuration file not found at {}", private_path(&path));
        }
        return Ok((Config::default(), None));
    }

    let config = load_from_path(&path)?;
    Ok((config, Some(path)))
}

/// Read and validate a specific file.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)
        .with_context(|| format!("Invalid configuration in {}", private_path(path)))?;

    Ok(config)
}

/// Display form of a path with the home directory shortened to `~`.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}
