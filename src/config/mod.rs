//! Configuration for solpaper.
//!
//! Settings live in `solpaper.toml` inside `$XDG_CONFIG_HOME/solpaper/` (or the
//! directory given with `--config`). A default file is written on first run:
//!
//! ```toml
//! #[Pack]
//! pack = "default"        # Pack name under packs/ or a path to a pack directory
//!
//! #[Backend]
//! backend = "auto"        # "auto" (native setter) or "command"
//! #command = "swww img {image}"
//! max_sleep = 300         # Re-check the schedule at least every N seconds (10-3600)
//!
//! #[Location]
//! #latitude = 51.5074
//! #longitude = -0.1278
//! #timezone = "Europe/London"
//! ```
//!
//! Coordinates may also live in a `geo.toml` next to the main file, which takes
//! precedence. Without coordinates solar anchors use fixed clock times.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::geo::{Location, LocationError, location};

pub use builder::{create_default_config, create_example_pack};
pub use loading::{
    get_config_dir, get_config_path, get_custom_config_dir, get_geo_path, load, load_from_path,
    set_config_dir,
};
pub use watcher::{ConfigWatcher, start_config_watcher};

/// Private coordinates kept out of the main file.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub(crate) struct GeoConfig {
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
    pub(crate) timezone: Option<String>,
}

/// How wallpapers get applied.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Native setter for the running desktop (GNOME, KDE, XFCE, feh, macOS, Windows).
    #[default]
    Auto,
    /// A user command with `{image}` in place of the image path.
    Command,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Auto => "auto",
            Backend::Command => "command",
        }
    }
}

/// Settings from `solpaper.toml`. Missing fields are filled in by
/// [`loading::load_from_path`].
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Pack name under `<config>/packs/`, or a path.
    pub pack: Option<String>,
    pub backend: Option<Backend>,
    /// Command template for `backend = "command"`.
    pub command: Option<String>,
    /// Seconds between schedule checks at most.
    pub max_sleep: Option<u64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// IANA zone name. Looked up from the coordinates when missing.
    pub timezone: Option<String>,
}

impl Config {
    pub fn pack_name(&self) -> &str {
        self.pack.as_deref().unwrap_or(DEFAULT_PACK)
    }

    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    pub fn max_sleep(&self) -> Duration {
        Duration::from_secs(self.max_sleep.unwrap_or(DEFAULT_MAX_SLEEP))
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Build the location the schedule is evaluated for.
    ///
    /// With coordinates the timezone is the configured one or the zone found at
    /// the coordinates. Without them only the timezone (configured or system) is
    /// known.
    pub fn location(&self) -> Result<Location, LocationError> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Location::resolve(lat, lon, self.timezone.as_deref()),
            _ => {
                let tz = match self.timezone.as_deref() {
                    Some(name) => location::parse_timezone(name)?,
                    None => location::system_timezone(),
                };
                Ok(Location::timezone_only(tz))
            }
        }
    }

    /// Print the loaded settings.
    pub fn log_config(&self, config_dir: &Path) {
        log_block_start!(
            "Loaded configuration from {}",
            private_path(&config_dir.join(CONFIG_FILE_NAME))
        );
        if config_dir.join(GEO_FILE_NAME).exists() {
            log_indented!("Loaded coordinates from {GEO_FILE_NAME}");
        }

        log_indented!("Pack: {}", self.pack_name());
        match self.backend() {
            Backend::Auto => log_indented!("Backend: auto"),
            Backend::Command => log_indented!(
                "Backend: command ({})",
                self.command.as_deref().unwrap_or("")
            ),
        }
        log_indented!("Maximum sleep: {} seconds", self.max_sleep().as_secs());

        match self.location() {
            Ok(location) => log_indented!("Location: {location}"),
            Err(e) => log_indented!("Location: {e}"),
        }
        if !self.has_coordinates() {
            log_indented!("Solar events use fixed clock times until coordinates are set");
        }
    }
}

#[cfg(test)]
mod tests;
