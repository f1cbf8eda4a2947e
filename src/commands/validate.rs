//! `solpaper validate [PACK]`: report every problem in a pack.

use anyhow::{Result, bail};

use crate::common::utils::private_path;
use crate::config;
use crate::pack::{self, validate::Level, validate_pack};

pub fn handle_validate_command(pack_name: Option<&str>, debug_enabled: bool) -> Result<()> {
    log_version!();

    let config = config::load()?;
    let config_dir = config::get_config_dir()?;
    let dir = pack::pack_dir(&config_dir, pack_name.unwrap_or(config.pack_name()));

    log_block_start!("Validating {}", private_path(&dir));
    let report = validate_pack(&dir);

    for issue in report.issues() {
        match issue.level {
            Level::Error => log_error!("{}", issue.message),
            Level::Warning => log_warning!("{}", issue.message),
        }
        if debug_enabled {
            log_indented!("check: {}", issue.check);
        }
    }

    let errors = report.errors().count();
    let warnings = report.warnings().count();
    if errors > 0 {
        bail!("{errors} error(s), {warnings} warning(s)");
    }

    let loaded = pack::load_pack(&dir)?;
    log_pipe!();
    log_info!(
        "{} is valid: {} segment(s), {warnings} warning(s)",
        loaded.name(),
        loaded.model.len()
    );
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("validate - Check a pack");
    log_block_start!("Usage: solpaper validate [PACK]");
    log_block_start!("Description:");
    log_indented!("Checks the manifest, every anchor and every image of a pack and");
    log_indented!("reports all problems at once. PACK is a name under <config>/packs/");
    log_indented!("or a path; the configured pack is checked when it is omitted.");
    log_block_start!("Checks:");
    log_indented!("errors:   missing manifest, bad TOML, no segments, bad anchors,");
    log_indented!("          missing images");
    log_indented!("warnings: no [meta] name, duplicate anchors, unusual extensions");
    log_end!();
}
