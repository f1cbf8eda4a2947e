//! The `schedule.toml` manifest as it appears on disk.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::common::constants::PACK_IMAGES_DIR_NAME;

/// How a pack lays out its images.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    /// `[[segments]]` with clock or solar anchors.
    #[default]
    Segments,
    /// A `[days]` table keyed by weekday.
    Days,
}

/// `[meta]` table. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PackMeta {
    #[serde(rename = "type", default)]
    pub kind: PackKind,
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
}

/// One `[[segments]]` entry before its anchor is parsed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawSegment {
    pub start: String,
    pub image: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Manifest {
    #[serde(default)]
    pub meta: PackMeta,
    #[serde(default)]
    pub segments: Vec<RawSegment>,
    /// Weekday entries of a `days` pack, in file order.
    #[serde(default)]
    pub days: toml::Table,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Where an image reference points: `<pack>/images/<ref>` when that exists,
/// `<pack>/<ref>` otherwise. Absolute references are kept.
pub fn resolve_image(pack_dir: &Path, reference: &str) -> PathBuf {
    let reference = Path::new(reference.trim());
    if reference.is_absolute() {
        return reference.to_path_buf();
    }

    let in_images = pack_dir.join(PACK_IMAGES_DIR_NAME).join(reference);
    if in_images.exists() {
        in_images
    } else {
        pack_dir.join(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = Manifest::parse(
            r#"
            [meta]
            name = "Coastal"
            author = "someone"
            version = "1.0"

            [[segments]]
            start = "sunrise-15"
            image = "morning.jpg"
            label = "morning"

            [[segments]]
            start = "19:00"
            image = "night.jpg"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.meta.name.as_deref(), Some("Coastal"));
        assert_eq!(manifest.meta.description, None);
        assert_eq!(manifest.segments.len(), 2);
        assert_eq!(manifest.segments[0].label.as_deref(), Some("morning"));
        assert_eq!(manifest.segments[1].start, "19:00");
    }

    #[test]
    fn test_parse_empty_manifest() {
        let manifest = Manifest::parse("").unwrap();
        assert!(manifest.segments.is_empty());
        assert_eq!(manifest.meta, PackMeta::default());
    }

    #[test]
    fn test_parse_days_manifest_keeps_order() {
        let manifest = Manifest::parse(
            r#"
            [meta]
            type = "days"

            [days]
            sunday = "rest.jpg"
            monday = { images = ["a.jpg", "b.jpg"] }
            "#,
        )
        .unwrap();

        assert_eq!(manifest.meta.kind, PackKind::Days);
        let keys: Vec<&str> = manifest.days.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["sunday", "monday"]);
    }

    #[test]
    fn test_unknown_pack_type_is_rejected() {
        assert!(Manifest::parse("[meta]\ntype = \"random\"\n").is_err());
        assert_eq!(Manifest::parse("").unwrap().meta.kind, PackKind::Segments);
    }

    #[test]
    fn test_segment_requires_start_and_image() {
        assert!(Manifest::parse("[[segments]]\nimage = \"a.jpg\"\n").is_err());
        assert!(Manifest::parse("[[segments]]\nstart = \"noon\"\n").is_err());
    }

    #[test]
    fn test_resolve_image_prefers_images_dir() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images/day.jpg"), b"").unwrap();

        assert_eq!(
            resolve_image(dir.path(), "day.jpg"),
            dir.path().join("images/day.jpg")
        );
        assert_eq!(
            resolve_image(dir.path(), "night.jpg"),
            dir.path().join("night.jpg")
        );
        assert_eq!(
            resolve_image(dir.path(), "/usr/share/backgrounds/a.png"),
            PathBuf::from("/usr/share/backgrounds/a.png")
        );
    }
}
