//! `solpaper status [--json]`: resolve once and report the active segment.
//!
//! Resolution is a pure function of the configuration and the clock, so the
//! report matches what the service shows without talking to it.

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::Serialize;
use std::path::PathBuf;

use crate::common::utils::{format_duration, private_path};
use crate::io::instance;
use crate::pack::Pack;
use crate::schedule::{self, ScheduleResult};
use crate::solpaper::Session;
use crate::time_source;

/// Everything `status` prints.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    pub pack: String,
    pub location: String,
    pub calculator: String,
    pub now: DateTime<FixedOffset>,
    pub active_segment: String,
    pub active_image: PathBuf,
    pub active_since: DateTime<FixedOffset>,
    pub next_segment: String,
    pub next_change_at: DateTime<FixedOffset>,
    pub seconds_until_change: u64,
    /// Set when the active anchor's event does not occur today.
    pub fallback: Option<String>,
    /// PID of the running service, if any.
    pub service_pid: Option<u32>,
}

impl StatusReport {
    pub(crate) fn new(
        session: &Session,
        result: &ScheduleResult,
        now: &DateTime<Tz>,
        service_pid: Option<u32>,
    ) -> Self {
        let segment_name = |index: usize| segment_name(&session.pack, index);
        Self {
            pack: session.pack.name(),
            location: session.location.to_string(),
            calculator: session.calculator.name().to_string(),
            now: now.fixed_offset(),
            active_segment: segment_name(result.active_index),
            active_image: result.active_image.clone(),
            active_since: result.active_since.fixed_offset(),
            next_segment: segment_name(result.next_index),
            next_change_at: result.next_change_at.fixed_offset(),
            seconds_until_change: result.time_until_change(now).as_secs(),
            fallback: result.fallback.map(|f| f.to_string()),
            service_pid,
        }
    }
}

fn segment_name(pack: &Pack, index: usize) -> String {
    pack.model
        .get(index)
        .map(|s| s.display_name())
        .unwrap_or_default()
}

pub fn handle_status_command(json: bool, debug_enabled: bool) -> Result<()> {
    // Adopts the service's config dir when it runs with --config.
    let service_pid = instance::get_running_instance().map(|info| info.pid);

    let session = Session::load()?;
    let now = time_source::now().with_timezone(&session.location.timezone());
    let result = schedule::resolve(
        &session.pack.model,
        &session.location,
        &now,
        session.calculator.as_ref(),
    )?;
    let report = StatusReport::new(&session, &result, &now, service_pid);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("          Pack: {}", report.pack);
    println!("      Location: {}", report.location);
    println!("        Active: {}", report.active_segment);
    println!("         Image: {}", private_path(&report.active_image));
    println!("         Since: {}", report.active_since.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "   Next change: {} ({}) in {}",
        report.next_change_at.format("%Y-%m-%d %H:%M:%S"),
        report.next_segment,
        format_duration(std::time::Duration::from_secs(report.seconds_until_change))
    );
    if let Some(fallback) = &report.fallback {
        println!("      Fallback: {fallback}");
    }
    match report.service_pid {
        Some(pid) => println!("       Service: running (PID {pid})"),
        None => println!("       Service: not running"),
    }
    if debug_enabled {
        println!("    Calculator: {}", report.calculator);
    }
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("status - Show the active wallpaper");
    log_block_start!("Usage: solpaper status [--json]");
    log_block_start!("Description:");
    log_indented!("Resolves the schedule for the current time and prints the active");
    log_indented!("segment, its image, and when the next segment starts.");
    log_block_start!("Options:");
    log_indented!("--json    Print the report as JSON");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{FixedSolarTimes, Location, SolarEvent};
    use crate::pack::PackMeta;
    use crate::schedule::{Anchor, Segment, SegmentModel};
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_report_fields_and_json_shape() {
        let location = Location::timezone_only(chrono_tz::Europe::Berlin);
        let session = Session {
            config_dir: PathBuf::from("/cfg"),
            config: crate::config::Config::default(),
            location,
            calculator: Box::new(FixedSolarTimes),
            pack: Pack {
                dir: PathBuf::from("/cfg/packs/test"),
                meta: PackMeta {
                    name: Some("Test".into()),
                    ..PackMeta::default()
                },
                model: SegmentModel::new(vec![
                    Segment::new(Anchor::solar(SolarEvent::Sunrise, 0), "/p/day.jpg")
                        .with_label("day"),
                    Segment::new(Anchor::solar(SolarEvent::Sunset, 0), "/p/night.jpg")
                        .with_label("night"),
                ]),
            },
        };

        let now = chrono_tz::Europe::Berlin
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2024, 5, 2)
                    .unwrap()
                    .and_hms_opt(17, 30, 0)
                    .unwrap(),
            )
            .unwrap();
        let result = schedule::resolve(
            &session.pack.model,
            &session.location,
            &now,
            session.calculator.as_ref(),
        )
        .unwrap();

        let report = StatusReport::new(&session, &result, &now, Some(42));
        assert_eq!(report.pack, "Test");
        assert_eq!(report.active_segment, "day");
        assert_eq!(report.next_segment, "night");
        assert_eq!(report.seconds_until_change, 3600);
        assert_eq!(report.calculator, "fixed");

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["active_image"], "/p/day.jpg");
        assert_eq!(value["next_change_at"], "2024-05-02T18:30:00+02:00");
        assert_eq!(value["service_pid"], 42);
        assert!(value["fallback"].is_null());
    }
}
