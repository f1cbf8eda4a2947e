//! Wallpaper packs on disk.
//!
//! A pack is a directory holding a `schedule.toml` manifest and its images:
//!
//! ```text
//! ~/.config/solpaper/packs/coastal/
//! ├── schedule.toml
//! └── images/
//!     ├── morning.jpg
//!     └── night.jpg
//! ```
//!
//! [`load_pack`] turns such a directory into a [`SegmentModel`] or fails with the
//! first problem found. [`validate::validate_pack`] reports every problem.
//! Packs with `type = "days"` are expanded by [`days`].

pub mod days;
pub mod manifest;
pub mod validate;

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::constants::{PACK_MANIFEST_NAME, PACKS_DIR_NAME};
use crate::common::utils::private_path;
use crate::schedule::{Anchor, Segment, SegmentModel};

pub use manifest::{Manifest, PackKind, PackMeta, resolve_image};
pub use validate::{ValidationReport, validate_pack};

/// A loaded pack.
#[derive(Debug, Clone, PartialEq)]
pub struct Pack {
    pub dir: PathBuf,
    pub meta: PackMeta,
    pub model: SegmentModel,
}

impl Pack {
    /// `[meta] name`, or the directory name.
    pub fn name(&self) -> String {
        self.meta.name.clone().unwrap_or_else(|| dir_name(&self.dir))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(PACK_MANIFEST_NAME)
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Directory holding the packs of a config directory.
pub fn packs_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(PACKS_DIR_NAME)
}

/// Map the `pack` config value to a directory. Plain names are looked up under
/// `<config>/packs/`; anything that looks like a path is used as one, with `~`
/// expanded.
pub fn pack_dir(config_dir: &Path, pack: &str) -> PathBuf {
    let pack = pack.trim();
    if let Some(rest) = pack.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if pack.contains('/') || pack.starts_with('.') {
        let path = PathBuf::from(pack);
        return if path.is_absolute() {
            path
        } else {
            config_dir.join(path)
        };
    }
    packs_dir(config_dir).join(pack)
}

/// Load and check a pack directory.
pub fn load_pack(dir: &Path) -> Result<Pack> {
    let manifest_path = dir.join(PACK_MANIFEST_NAME);
    let content = fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read pack manifest {}", private_path(&manifest_path)))?;
    let manifest = Manifest::parse(&content)
        .with_context(|| format!("Failed to parse pack manifest {}", private_path(&manifest_path)))?;

    let segments = match manifest.meta.kind {
        PackKind::Segments => segment_list(dir, &manifest, &manifest_path)?,
        PackKind::Days => {
            let entries = days::parse_days(&manifest.days)
                .with_context(|| format!("Invalid [days] in {}", private_path(&manifest_path)))?;
            days::week_segments(&entries, |image| resolve_image(dir, image))
        }
    };

    Ok(Pack {
        dir: dir.to_path_buf(),
        meta: manifest.meta,
        model: SegmentModel::new(segments),
    })
}

fn segment_list(dir: &Path, manifest: &Manifest, manifest_path: &Path) -> Result<Vec<Segment>> {
    if manifest.segments.is_empty() {
        bail!(
            "Pack {} declares no segments (add at least one [[segments]] entry)",
            private_path(dir)
        );
    }

    let mut segments = Vec::with_capacity(manifest.segments.len());
    for (index, raw) in manifest.segments.iter().enumerate() {
        let anchor: Anchor = raw
            .start
            .parse()
            .with_context(|| format!("Segment {} in {}", index + 1, private_path(manifest_path)))?;
        let mut segment = Segment::new(anchor, resolve_image(dir, &raw.image));
        if let Some(label) = &raw.label {
            segment = segment.with_label(label.clone());
        }
        segments.push(segment);
    }
    Ok(segments)
}

/// A pack found under the packs directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PackSummary {
    pub dir_name: String,
    pub dir: PathBuf,
    /// The loaded pack, or why it failed to load.
    pub pack: Result<Pack, String>,
}

/// Every subdirectory of `<config>/packs/` holding a manifest, sorted by name.
pub fn list_packs(config_dir: &Path) -> Result<Vec<PackSummary>> {
    let root = packs_dir(config_dir);
    if !root.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&root)
        .with_context(|| format!("Failed to list packs in {}", private_path(&root)))?;

    let mut packs: Vec<PackSummary> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.join(PACK_MANIFEST_NAME).is_file())
        .map(|dir| PackSummary {
            dir_name: dir_name(&dir),
            pack: load_pack(&dir).map_err(|e| format!("{e:#}")),
            dir,
        })
        .collect();

    packs.sort_by(|a, b| a.dir_name.cmp(&b.dir_name));
    Ok(packs)
}
