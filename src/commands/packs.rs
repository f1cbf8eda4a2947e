//! `solpaper packs`: list installed packs.

use anyhow::Result;

use crate::common::utils::private_path;
use crate::config;
use crate::pack::{self, list_packs};

pub fn handle_packs_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let config = config::load()?;
    let config_dir = config::get_config_dir()?;
    let active_dir = pack::pack_dir(&config_dir, config.pack_name());
    let packs = list_packs(&config_dir)?;

    log_block_start!("Packs in {}", private_path(&pack::packs_dir(&config_dir)));
    if packs.is_empty() {
        log_indented!("(none)");
    }

    for summary in &packs {
        let marker = if summary.dir == active_dir { "*" } else { " " };
        match &summary.pack {
            Ok(pack) => {
                log_indented!(
                    "{marker} {:<16} {} segment(s)  {}",
                    summary.dir_name,
                    pack.model.len(),
                    pack.meta.name.as_deref().unwrap_or("")
                );
                if debug_enabled {
                    if let Some(author) = &pack.meta.author {
                        log_indented!("    author: {author}");
                    }
                    if let Some(description) = &pack.meta.description {
                        log_indented!("    {description}");
                    }
                }
            }
            Err(e) => log_indented!("{marker} {:<16} broken: {e}", summary.dir_name),
        }
    }

    if !packs.iter().any(|p| p.dir == active_dir) {
        log_pipe!();
        log_warning!("Configured pack '{}' is not installed here", config.pack_name());
        log_indented!("Looked in {}", private_path(&active_dir));
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("packs - List installed packs");
    log_block_start!("Usage: solpaper packs");
    log_block_start!("Description:");
    log_indented!("Lists every directory under <config>/packs/ that holds a");
    log_indented!("schedule.toml. The configured pack is marked with '*'.");
    log_end!();
}
