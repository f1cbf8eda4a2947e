//! Desktop wallpaper through the `wallpaper` crate.

use anyhow::{Context, Result, anyhow};
use std::path::Path;

use super::WallpaperBackend;

/// Uses whatever the `wallpaper` crate detects for the running desktop.
#[derive(Debug, Default)]
pub struct NativeBackend;

impl WallpaperBackend for NativeBackend {
    fn backend_name(&self) -> &'static str {
        "native"
    }

    fn apply(&mut self, image: &Path) -> Result<()> {
        let path = image
            .to_str()
            .with_context(|| format!("Image path is not valid UTF-8: {}", image.display()))?;
        wallpaper::set_from_path(path).map_err(|e| anyhow!("Failed to set wallpaper: {e}"))
    }
}
