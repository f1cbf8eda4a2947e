//! `solpaper reload`: ask the running service to re-read its configuration.

use anyhow::Result;
use nix::sys::signal::Signal;

use crate::io::instance;

pub fn handle_reload_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    // Finding the instance also adopts its config dir, so the check below reads
    // the same files the service will.
    if instance::get_running_instance().is_none() {
        log_error_exit!("solpaper isn't running");
        return Ok(());
    }

    // Refuse to signal with a configuration the service would reject anyway.
    if let Err(e) = crate::config::load() {
        log_error_exit!("Configuration is invalid, not reloading: {e:#}");
        return Ok(());
    }

    let info = instance::signal_instance(Signal::SIGUSR2)?;
    if debug_enabled {
        log_pipe!();
        log_debug!("SIGUSR2 sent to process {}", info.pid);
    }
    log_block_start!("Sent reload signal to solpaper (PID: {})", info.pid);
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("reload - Reload configuration and pack");
    log_block_start!("Usage: solpaper reload");
    log_block_start!("Description:");
    log_indented!("Signals the running service to re-read solpaper.toml, geo.toml");
    log_indented!("and the active pack. Edits are usually picked up automatically;");
    log_indented!("use this when hot reload is unavailable.");
    log_indented!("An invalid configuration is reported and nothing is sent.");
    log_end!();
}
