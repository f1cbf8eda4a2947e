//! Human readable output for solar calculations.

use super::location::Location;
use super::solar::{SolarEvents, format_event_time};

/// Print the event table for one date, as used by `solpaper schedule` and the
/// service loop in debug mode.
pub fn log_solar_events(events: &SolarEvents, location: &Location, calculator: &str) {
    log_block_start!(
        "Solar events for {} at {}",
        events.date().format("%A %Y-%m-%d"),
        location
    );
    if !location.has_coordinates() {
        log_indented!("No coordinates configured, using fixed times");
    }

    let mut missing = Vec::new();
    for (event, at) in events.iter() {
        if at.is_none() {
            missing.push(event.name());
        }
        log_indented!("{:<18} {}", event.name(), format_event_time(at));
    }

    if !missing.is_empty() {
        log_pipe!();
        log_info!("Not occurring on this date: {}", missing.join(", "));
        log_indented!("Anchors on these events fall back to an earlier event");
    }

    log_pipe!();
    log_debug!("Calculator: {calculator}");
}
