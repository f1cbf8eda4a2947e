//! `solpaper help [COMMAND]`

use anyhow::Result;

use crate::args::COMMANDS;

pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => crate::args::display_help(),
        Some("status") => super::status::display_help(),
        Some("schedule") => super::schedule::display_help(),
        Some("apply") => super::apply::display_help(),
        Some("validate") => super::validate::display_help(),
        Some("packs") => super::packs::display_help(),
        Some("reload") => super::reload::display_help(),
        Some("stop") => super::stop::display_help(),
        Some("simulate") => super::simulate::display_help(),
        Some("help") => display_help_help(),
        Some(unknown) => {
            log_warning_standalone!("Unknown command: {unknown}");
            log_warning_standalone!("Available commands: {}", COMMANDS.join(", "));
            crate::args::display_help();
        }
    }
    Ok(())
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: solpaper help [COMMAND]");
    log_block_start!("Examples:");
    log_indented!("solpaper help");
    log_indented!("solpaper help simulate");
    log_end!();
}
