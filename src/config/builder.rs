//! Default configuration and example pack creation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::geo::location::system_timezone;

/// Write a commented default `solpaper.toml` at `path`.
///
/// Location keys are left commented out. When a `geo.toml` already sits next to
/// the file it keeps providing them.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let content = ConfigBuilder::new()
        .add_section("Pack")
        .add_setting(
            "pack",
            &format!("\"{DEFAULT_PACK}\""),
            "Pack name under packs/ or a path to a pack directory",
        )
        .add_section("Backend")
        .add_setting(
            "backend",
            &format!("\"{DEFAULT_BACKEND}\""),
            "\"auto\" (native wallpaper setter) or \"command\"",
        )
        .add_commented_setting(
            "command",
            &format!("\"swww img {COMMAND_IMAGE_PLACEHOLDER}\""),
            "Command for backend = \"command\", {image} is the image path",
        )
        .add_setting(
            "max_sleep",
            &DEFAULT_MAX_SLEEP.to_string(),
            &format!(
                "Re-check the schedule at least every N seconds ({MINIMUM_MAX_SLEEP}-{MAXIMUM_MAX_SLEEP})"
            ),
        )
        .add_section("Location")
        .add_commented_setting("latitude", "51.5074", "Degrees, north positive (-90 to 90)")
        .add_commented_setting("longitude", "-0.1278", "Degrees, east positive (-180 to 180)")
        .add_commented_setting(
            "timezone",
            &format!("\"{}\"", system_timezone()),
            "IANA zone, looked up from the coordinates when unset",
        )
        .build();

    fs::write(path, content + "\n").context("Failed to write default config file")?;
    log_block_start!("Created default configuration: {}", private_path(path));
    log_indented!("Set latitude and longitude to follow the real sun");
    Ok(())
}

/// Write an example pack to `<config>/packs/default/` unless one exists.
///
/// The pack only holds a manifest; its images are expected in `images/`.
pub fn create_example_pack(config_dir: &Path) -> Result<()> {
    let pack_dir = config_dir.join(PACKS_DIR_NAME).join(DEFAULT_PACK);
    let manifest_path = pack_dir.join(PACK_MANIFEST_NAME);
    if manifest_path.exists() {
        return Ok(());
    }

    fs::create_dir_all(pack_dir.join(PACK_IMAGES_DIR_NAME))
        .with_context(|| format!("Failed to create {}", private_path(&pack_dir)))?;

    let manifest = r#"# Segments start at a clock time ("07:30", "7:30 pm") or at a solar event
# with an optional offset in minutes ("sunrise-15", "noon+30m").
# Images are looked up in images/ first, then next to this file.

[meta]
name = "Default"
description = "Example pack, put your own images in images/"
version = "1.0"

[[segments]]
start = "dawn"
image = "dawn.jpg"
label = "dawn"

[[segments]]
start = "sunrise+30"
image = "day.jpg"
label = "day"

[[segments]]
start = "sunset-45"
image = "golden-hour.jpg"
label = "golden hour"

[[segments]]
start = "dusk"
image = "night.jpg"
label = "night"
"#;

    fs::write(&manifest_path, manifest)
        .with_context(|| format!("Failed to write {}", private_path(&manifest_path)))?;
    log_indented!("Created example pack: {}", private_path(&pack_dir));
    Ok(())
}

/// Builds config files with comments aligned in one column.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A setting that is present but disabled.
    fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("#{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !result.is_empty() {
                        result.push(String::new());
                    }
                    result.push(title);
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_aligns_comments() {
        let text = ConfigBuilder::new()
            .add_section("A")
            .add_setting("x", "1", "short")
            .add_commented_setting("longer_key", "\"value\"", "long")
            .build();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#[A]");
        let column = |line: &str| line.find("# ").unwrap();
        assert_eq!(column(lines[1]), column(lines[2]));
        assert!(lines[2].starts_with("#longer_key = "));
    }

    #[test]
    fn test_sections_are_separated_by_blank_lines() {
        let text = ConfigBuilder::new()
            .add_section("A")
            .add_setting("x", "1", "c")
            .add_section("B")
            .build();
        assert_eq!(text.lines().nth(2), Some(""));
        assert_eq!(text.lines().nth(3), Some("#[B]"));
    }
}
