//! Pack linting for `solpaper validate`.
//!
//! Unlike [`super::load_pack`], which stops at the first problem, validation
//! collects every problem it can find so authors can fix a pack in one pass.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::days::{self, DayEntry, DaysError};
use super::manifest::{Manifest, PackKind, resolve_image};
use crate::common::constants::{
    IMAGE_EXTENSIONS, MIN_IMAGE_HEIGHT, MIN_IMAGE_WIDTH, PACK_MANIFEST_NAME,
};
use crate::common::utils::private_path;
use crate::schedule::{Anchor, weekday_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub level: Level,
    /// Short identifier of the check that produced the issue.
    pub check: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<Issue>,
}

impl ValidationReport {
    fn error(&mut self, check: &'static str, message: String) {
        self.issues.push(Issue {
            level: Level::Error,
            check,
            message,
        });
    }

    fn warning(&mut self, check: &'static str, message: String) {
        self.issues.push(Issue {
            level: Level::Warning,
            check,
            message,
        });
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.level == Level::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.level == Level::Warning)
    }

    pub fn passed(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn has_check(&self, check: &str) -> bool {
        self.issues.iter().any(|i| i.check == check)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check a pack directory without loading it.
pub fn validate_pack(dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !dir.is_dir() {
        report.error(
            "pack_missing",
            format!("{} is not a directory", private_path(dir)),
        );
        return report;
    }

    let manifest_path = dir.join(PACK_MANIFEST_NAME);
    let content = match fs::read_to_string(&manifest_path) {
        Ok(content) => content,
        Err(e) => {
            report.error(
                "manifest_missing",
                format!("cannot read {}: {e}", private_path(&manifest_path)),
            );
            return report;
        }
    };

    let manifest = match Manifest::parse(&content) {
        Ok(manifest) => manifest,
        Err(e) => {
            report.error("manifest_invalid", format!("{PACK_MANIFEST_NAME} is invalid: {e}"));
            return report;
        }
    };

    if manifest.meta.name.is_none() {
        report.warning(
            "meta_name",
            "[meta] has no name, the directory name is used".to_string(),
        );
    }

    match manifest.meta.kind {
        PackKind::Segments => check_segments(dir, &manifest, &mut report),
        PackKind::Days => check_days(dir, &manifest, &mut report),
    }

    report
}

fn check_segments(dir: &Path, manifest: &Manifest, report: &mut ValidationReport) {
    if !manifest.days.is_empty() {
        report.warning(
            "unused_days",
            "[days] is ignored unless [meta] type = \"days\"".to_string(),
        );
    }

    if manifest.segments.is_empty() {
        report.error("no_segments", "pack declares no [[segments]]".to_string());
        return;
    }

    let mut seen: HashMap<Anchor, usize> = HashMap::new();
    for (index, raw) in manifest.segments.iter().enumerate() {
        let number = index + 1;

        match raw.start.parse::<Anchor>() {
            Ok(anchor) => {
                if let Some(first) = seen.get(&anchor) {
                    report.warning(
                        "duplicate_anchor",
                        format!(
                            "segment {number} starts at '{anchor}' like segment {first}, only segment {first} is ever shown"
                        ),
                    );
                } else {
                    seen.insert(anchor, number);
                }
            }
            Err(e) => report.error("anchor_invalid", format!("segment {number}: {e}")),
        }

        check_image(&resolve_image(dir, &raw.image), &format!("segment {number}"), report);
    }
}

fn check_days(dir: &Path, manifest: &Manifest, report: &mut ValidationReport) {
    if !manifest.segments.is_empty() {
        report.warning(
            "unused_segments",
            "[[segments]] is ignored in a days pack".to_string(),
        );
    }

    if manifest.days.is_empty() {
        report.error("no_days", "days pack has an empty or missing [days] table".to_string());
        return;
    }

    let mut entries: Vec<DayEntry> = Vec::new();
    for (key, value) in &manifest.days {
        match days::parse_entry(key, value) {
            Ok(entry) if entries.iter().any(|e| e.weekday == entry.weekday) => {
                report.error("duplicate_day", DaysError::Duplicate(key.clone()).to_string());
            }
            Ok(entry) => {
                for image in &entry.images {
                    check_image(&resolve_image(dir, image), key, report);
                }
                entries.push(entry);
            }
            Err(e) => report.error("day_invalid", e.to_string()),
        }
    }

    let missing = days::missing_days(&entries);
    if let Some(first) = entries.first()
        && !missing.is_empty()
    {
        let names: Vec<&str> = missing.iter().map(|d| weekday_name(*d)).collect();
        report.warning(
            "days_missing",
            format!(
                "{} not listed, showing {}'s images",
                names.join(", "),
                weekday_name(first.weekday)
            ),
        );
    }
}

fn check_image(image: &Path, owner: &str, report: &mut ValidationReport) {
    if !image.is_file() {
        report.error(
            "image_missing",
            format!("{owner}: image {} not found", private_path(image)),
        );
        return;
    }

    let dimensions = image::ImageReader::open(image)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::from)
        .and_then(|reader| reader.into_dimensions());

    match dimensions {
        Err(e) => report.error(
            "image_invalid",
            format!("{owner}: {} cannot be read as an image: {e}", private_path(image)),
        ),
        Ok((width, height)) if width < MIN_IMAGE_WIDTH || height < MIN_IMAGE_HEIGHT => {
            report.warning(
                "image_size",
                format!(
                    "{owner}: {} is {width}x{height}, smaller than {MIN_IMAGE_WIDTH}x{MIN_IMAGE_HEIGHT}",
                    private_path(image)
                ),
            )
        }
        Ok(_) if !has_image_extension(image) => report.warning(
            "image_extension",
            format!("{owner}: {} has an unusual extension", private_path(image)),
        ),
        Ok(_) => {}
    }
}
