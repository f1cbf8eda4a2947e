//! A backend that only reports what it would do.

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::WallpaperBackend;
use crate::common::utils::private_path;

#[derive(Debug, Default)]
pub struct DryRunBackend {
    applied: Vec<PathBuf>,
}

impl DryRunBackend {
    /// Images "applied" so far, oldest first.
    pub fn applied(&self) -> &[PathBuf] {
        &self.applied
    }
}

impl WallpaperBackend for DryRunBackend {
    fn backend_name(&self) -> &'static str {
        "dry-run"
    }

    fn apply(&mut self, image: &Path) -> Result<()> {
        log_decorated!("Would set wallpaper: {}", private_path(image));
        self.applied.push(image.to_path_buf());
        Ok(())
    }
}
