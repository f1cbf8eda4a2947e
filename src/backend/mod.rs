//! Wallpaper application.
//!
//! Everything that changes the desktop goes through the [`WallpaperBackend`]
//! trait, so the service loop never knows which mechanism is in use:
//!
//! - [`native::NativeBackend`]: the platform setter from the `wallpaper` crate
//!   (GNOME, KDE, XFCE, Cinnamon, MATE, LXDE, feh fallback, macOS, Windows)
//! - [`command::CommandBackend`]: a user command such as `swww img {image}`
//! - [`dry_run::DryRunBackend`]: logs instead of applying, used by `simulate`
//!
//! Selection follows the `backend` config key. Dry runs override it.

use anyhow::{Result, bail};
use std::path::Path;

use crate::common::utils::private_path;
use crate::config::{Backend, Config};

pub mod command;
pub mod dry_run;
pub mod native;

/// Something that can put an image on the desktop.
#[cfg_attr(test, mockall::automock)]
pub trait WallpaperBackend {
    /// Short name for logs.
    fn backend_name(&self) -> &'static str;

    /// Show `image`. Only called with paths that exist.
    fn apply(&mut self, image: &Path) -> Result<()>;
}

/// Build the backend the configuration asks for.
pub fn create_backend(config: &Config, dry_run: bool) -> Result<Box<dyn WallpaperBackend>> {
    if dry_run {
        return Ok(Box::new(dry_run::DryRunBackend::default()));
    }

    match config.backend() {
        Backend::Auto => Ok(Box::new(native::NativeBackend)),
        Backend::Command => {
            let Some(template) = config.command.as_deref() else {
                bail!("backend = \"command\" requires a command");
            };
            Ok(Box::new(command::CommandBackend::new(template)?))
        }
    }
}

/// Check that `image` exists, then apply it.
///
/// A missing image is an error and leaves the current wallpaper in place.
pub fn apply_image(backend: &mut dyn WallpaperBackend, image: &Path) -> Result<()> {
    if !image.is_file() {
        bail!("Image not found: {}", private_path(image));
    }
    backend.apply(image)
}
