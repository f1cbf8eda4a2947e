//! Wallpaper through a user command.
//!
//! The template is split like a shell would (quotes group words, nothing is
//! expanded), then each `{image}` is replaced by the image path. A template
//! without the placeholder gets the path as its last argument.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

use super::WallpaperBackend;
use crate::common::constants::COMMAND_IMAGE_PLACEHOLDER;

#[derive(Debug, Clone, PartialEq)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(template: &str) -> Result<Self> {
        let mut parts = shell_words::split(template)
            .with_context(|| format!("Invalid wallpaper command '{template}'"))?
            .into_iter();
        let Some(program) = parts.next() else {
            bail!("Wallpaper command is empty");
        };
        let mut args: Vec<String> = parts.collect();
        let uses_placeholder = program.contains(COMMAND_IMAGE_PLACEHOLDER)
            || args.iter().any(|a| a.contains(COMMAND_IMAGE_PLACEHOLDER));
        if !uses_placeholder {
            args.push(COMMAND_IMAGE_PLACEHOLDER.to_string());
        }
        Ok(Self { program, args })
    }

    /// Program and arguments for `image`.
    pub fn command_line(&self, image: &Path) -> (String, Vec<String>) {
        let image = image.display().to_string();
        let fill = |part: &str| part.replace(COMMAND_IMAGE_PLACEHOLDER, &image);
        (
            fill(&self.program),
            self.args.iter().map(|a| fill(a)).collect(),
        )
    }
}

impl WallpaperBackend for CommandBackend {
    fn backend_name(&self) -> &'static str {
        "command"
    }

    fn apply(&mut self, image: &Path) -> Result<()> {
        let (program, args) = self.command_line(image);
        let output = Command::new(&program)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run wallpaper command '{program}'"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Wallpaper command '{program}' failed ({}): {}",
                output.status,
                stderr.trim()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_substituted() {
        let backend = CommandBackend::new("swww img {image} --transition-type fade").unwrap();
        let (program, args) = backend.command_line(Path::new("/p/day.jpg"));
        assert_eq!(program, "swww");
        assert_eq!(args, vec!["img", "/p/day.jpg", "--transition-type", "fade"]);
    }

    #[test]
    fn test_path_appended_without_placeholder() {
        let backend = CommandBackend::new("feh --bg-fill").unwrap();
        let (_, args) = backend.command_line(Path::new("/p/night.png"));
        assert_eq!(args, vec!["--bg-fill", "/p/night.png"]);
    }

    #[test]
    fn test_placeholder_inside_argument() {
        let backend = CommandBackend::new("set-bg --file={image}").unwrap();
        let (_, args) = backend.command_line(Path::new("/p/a.jpg"));
        assert_eq!(args, vec!["--file=/p/a.jpg"]);
    }

    #[test]
    fn test_quoted_words_stay_together() {
        let backend = CommandBackend::new(r#"sh -c "feh --bg-fill {image}""#).unwrap();
        let (program, args) = backend.command_line(Path::new("/p/a.jpg"));
        assert_eq!(program, "sh");
        assert_eq!(args, vec!["-c", "feh --bg-fill /p/a.jpg"]);
    }

    #[test]
    fn test_image_path_with_spaces_is_one_argument() {
        let backend = CommandBackend::new("feh --bg-fill").unwrap();
        let (_, args) = backend.command_line(Path::new("/p/my day.jpg"));
        assert_eq!(args, vec!["--bg-fill", "/p/my day.jpg"]);
    }

    #[test]
    fn test_empty_template_is_rejected() {
        assert!(CommandBackend::new("   ").is_err());
    }

    #[test]
    fn test_unbalanced_quote_is_rejected() {
        let err = CommandBackend::new(r#"swww img "{image}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid wallpaper command"), "{err}");
    }

    #[test]
    fn test_exit_status_is_checked() {
        let mut ok = CommandBackend::new("true").unwrap();
        assert!(ok.apply(Path::new("/p/a.jpg")).is_ok());

        let mut failing = CommandBackend::new("false").unwrap();
        let err = failing.apply(Path::new("/p/a.jpg")).unwrap_err();
        assert!(err.to_string().contains("failed"), "{err}");

        let mut missing = CommandBackend::new("solpaper-no-such-program-xyz").unwrap();
        assert!(missing.apply(Path::new("/p/a.jpg")).is_err());
    }
}
