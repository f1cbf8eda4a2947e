//! `solpaper simulate <start> <end> [multiplier] [--log]`
//!
//! Replays a time range through the normal service loop on a simulated clock.
//! Nothing is applied; the dry-run backend logs each change instead. Times are
//! read in the schedule's timezone.

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use std::sync::Arc;

use crate::common::logger::Log;
use crate::config;
use crate::solpaper::Solpaper;
use crate::time_source::{self, SimulatedTimeSource};

pub fn handle_simulate_command(
    start_time: &str,
    end_time: &str,
    multiplier: f64,
    log_to_file: bool,
    debug_enabled: bool,
) -> Result<()> {
    let config = config::load()?;
    let tz = config
        .location()
        .context("Invalid location in configuration")?
        .timezone();

    let start = time_source::parse_datetime_in_tz(start_time, tz)
        .map_err(|e| anyhow!("Invalid start time: {e}"))?;
    let end = time_source::parse_datetime_in_tz(end_time, tz)
        .map_err(|e| anyhow!("Invalid end time: {e}"))?;
    if end <= start {
        bail!("End time must be after start time");
    }

    let _log_guard = if log_to_file {
        let file_name = format!(
            "solpaper-simulation-{}.log",
            Local::now().format("%Y%m%d-%H%M%S")
        );
        println!("Writing simulation log to {file_name}");
        Some(Log::start_file_logging(file_name)?)
    } else {
        None
    };

    // Installed before the first log line so every line carries simulated time.
    time_source::init_time_source(Arc::new(SimulatedTimeSource::new(
        start.with_timezone(&Local),
        end.with_timezone(&Local),
        multiplier,
    )));
    Log::set_schedule_timezone(tz);

    log_version!();
    log_block_start!("Simulation mode");
    log_decorated!(
        "Simulating from {} to {} ({tz})",
        start.format("%Y-%m-%d %H:%M:%S"),
        end.format("%Y-%m-%d %H:%M:%S")
    );
    let span = end - start;
    log_indented!(
        "Simulated time: {} hours {} minutes",
        span.num_hours(),
        span.num_minutes() % 60
    );
    if multiplier == 0.0 {
        log_indented!("Time acceleration: fast-forward");
    } else {
        log_indented!(
            "Time acceleration: {multiplier}x (about {:.1} seconds)",
            span.num_seconds() as f64 / multiplier
        );
    }

    Solpaper::new(debug_enabled)
        .without_lock()
        .without_headers()
        .dry_run()
        .run()
}

pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Replay a time range");
    log_block_start!("Usage: solpaper simulate <start> <end> [multiplier] [--log]");
    log_block_start!("Arguments:");
    log_indented!("start, end   \"YYYY-MM-DD HH:MM:SS\" in the schedule's timezone");
    log_indented!("multiplier   Simulated seconds per real second; 0 (default)");
    log_indented!("             runs as fast as possible");
    log_block_start!("Options:");
    log_indented!("--log        Write output to solpaper-simulation-<timestamp>.log");
    log_block_start!("Examples:");
    log_indented!("solpaper simulate \"2024-06-21 00:00:00\" \"2024-06-22 00:00:00\"");
    log_indented!("solpaper simulate \"2024-12-20 12:00:00\" \"2024-12-22 12:00:00\" 3600");
    log_end!();
}
