//! Configuration loading.
//!
//! Resolves the configuration directory, creates a default file on first run,
//! applies `geo.toml` overrides and defaults, then validates.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::validation::validate_config;
use super::{Config, GeoConfig};
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Directory given with `--config`, set once at startup.
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for this process. Fails if already set.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Directory holding `solpaper.toml`, `geo.toml` and `packs/`.
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(custom) = get_custom_config_dir() {
        return Ok(custom);
    }
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join(APP_DIR_NAME))
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

pub fn get_geo_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(GEO_FILE_NAME))
}

/// Load the configuration, creating a default file (and example pack) when none
/// exists yet.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config")?;
        if let Some(dir) = config_path.parent() {
            super::builder::create_example_pack(dir)
                .context("Failed to create example pack")?;
        }
    }

    load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", private_path(&config_path)))
}

/// Load configuration from a specific file. Does not create anything.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        bail!("Configuration file not found at {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    // Overrides go first so their values get validated too.
    load_geo_override_from_path(&mut config, path)?;

    validate_config(&config)?;
    apply_defaults(&mut config);

    Ok(config)
}

fn apply_defaults(config: &mut Config) {
    if config.pack.is_none() {
        config.pack = Some(DEFAULT_PACK.to_string());
    }
    if config.backend.is_none() {
        config.backend = Some(super::Backend::default());
    }
    if config.max_sleep.is_none() {
        config.max_sleep = Some(DEFAULT_MAX_SLEEP);
    }
}

/// Apply `geo.toml` from the directory of `config_path`, if present. A broken
/// geo file is reported and ignored.
pub(crate) fn load_geo_override_from_path(config: &mut Config, config_path: &Path) -> Result<()> {
    let Some(parent) = config_path.parent() else {
        return Ok(());
    };
    let geo_path = parent.join(GEO_FILE_NAME);
    if !geo_path.exists() {
        return Ok(());
    }

    let content = match fs::read_to_string(&geo_path) {
        Ok(content) => content,
        Err(e) => {
            log_warning!("Failed to read {GEO_FILE_NAME}: {e}. Using coordinates from main config.");
            return Ok(());
        }
    };

    match toml::from_str::<GeoConfig>(&content) {
        Ok(geo) => {
            if let Some(lat) = geo.latitude {
                config.latitude = Some(lat);
            }
            if let Some(lon) = geo.longitude {
                config.longitude = Some(lon);
            }
            if let Some(tz) = geo.timezone {
                config.timezone = Some(tz);
            }
        }
        Err(e) => {
            log_warning!("Failed to parse {GEO_FILE_NAME}: {e}. Using coordinates from main config.");
        }
    }

    Ok(())
}
