//! `solpaper schedule [DATE]`: the solar events and segment times of one day.

use anyhow::Result;
use chrono::NaiveDate;

use crate::geo;
use crate::schedule::{self, ResolvedAnchor};
use crate::solpaper::Session;
use crate::time_source;

pub fn handle_schedule_command(date: Option<NaiveDate>, debug_enabled: bool) -> Result<()> {
    log_version!();

    let session = Session::load()?;
    let location = &session.location;
    let calculator = session.calculator.as_ref();
    let now = time_source::now().with_timezone(&location.timezone());
    let date = date.unwrap_or_else(|| now.date_naive());

    let events = calculator.resolve_events(date, location)?;
    geo::log_solar_events(&events, location, calculator.name());

    let anchors = schedule::timeline(&session.pack.model, location, date, calculator)?;
    let active = if date == now.date_naive() {
        schedule::resolve(&session.pack.model, location, &now, calculator).ok()
    } else {
        None
    };

    log_block_start!("Segments of {} on {}", session.pack.name(), date.format("%Y-%m-%d"));
    for anchor in &anchors {
        let is_active = active
            .as_ref()
            .is_some_and(|a| a.active_index == anchor.segment_index && a.active_since == anchor.at);
        log_indented!("{}", describe(&session, anchor, is_active));
    }

    if debug_enabled {
        log_pipe!();
        log_debug!("Images:");
        for segment in session.pack.model.segments() {
            log_indented!("{:<16} {}", segment.anchor.to_string(), segment.image.display());
        }
    }
    log_end!();
    Ok(())
}

/// One timeline row: time, anchor text, segment name and notes.
fn describe(session: &Session, anchor: &ResolvedAnchor, is_active: bool) -> String {
    let Some(segment) = session.pack.model.get(anchor.segment_index) else {
        return String::new();
    };

    // Offsets can move an anchor onto the neighbouring day.
    let time = if anchor.at.date_naive() == anchor.date {
        anchor.at.format("%H:%M:%S").to_string()
    } else {
        anchor.at.format("%m-%d %H:%M:%S").to_string()
    };

    let mut line = format!("{time}  {:<16} {}", segment.anchor.to_string(), segment.display_name());
    if let Some(fallback) = &anchor.fallback {
        line.push_str(&format!(" ({fallback})"));
    }
    if is_active {
        line.push_str(" ← active");
    }
    line
}

pub fn display_help() {
    log_version!();
    log_block_start!("schedule - Show one day of the schedule");
    log_block_start!("Usage: solpaper schedule [YYYY-MM-DD]");
    log_block_start!("Description:");
    log_indented!("Prints the solar events for the configured location and the time");
    log_indented!("each segment of the active pack starts. Defaults to today.");
    log_block_start!("Examples:");
    log_indented!("solpaper schedule");
    log_indented!("solpaper schedule 2024-12-21");
    log_end!();
}
