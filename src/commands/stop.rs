//! `solpaper stop`: terminate the running service.

use anyhow::Result;
use nix::sys::signal::Signal;
use std::time::{Duration, Instant};

use crate::common::constants::STOP_TIMEOUT;
use crate::common::utils;
use crate::io::instance;

pub fn handle_stop_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let info = match instance::signal_instance(Signal::SIGTERM) {
        Ok(info) => info,
        Err(_) => {
            log_error_exit!("solpaper isn't running");
            return Ok(());
        }
    };

    log_block_start!("Stopping solpaper (PID: {})...", info.pid);
    if debug_enabled {
        log_pipe!();
        log_debug!("SIGTERM sent to process {}", info.pid);
    }

    let started = Instant::now();
    while started.elapsed() < STOP_TIMEOUT {
        if !utils::is_process_running(info.pid) {
            log_pipe!();
            log_info!("Process terminated successfully");
            log_end!();
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    log_pipe!();
    log_warning!("Process did not terminate within {} seconds", STOP_TIMEOUT.as_secs());
    log_indented!("The signal was sent; the process may still be shutting down");
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("stop - Stop the running service");
    log_block_start!("Usage: solpaper stop");
    log_block_start!("Description:");
    log_indented!("Sends SIGTERM to the running solpaper and waits up to 3 seconds");
    log_indented!("for it to exit. The current wallpaper stays on screen.");
    log_end!();
}
