//! Which segment is active at an instant, and when that changes.
//!
//! Resolution is a pure function of the pack, the location and `now`. Anchors are
//! resolved for yesterday, today and tomorrow (local dates), merged into one
//! timeline and searched for the last anchor at or before `now` and the first
//! one after it. Packs with large solar offsets widen that window by the days
//! their offsets can reach into.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use std::path::PathBuf;
use thiserror::Error;

use super::segment::{AnchorFallback, ResolvedAnchor, SegmentModel};
use crate::common::constants::MAX_LOOKAHEAD_DAYS;
use crate::geo::{Location, LocationError, SolarCalculator};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("pack has no segments")]
    NoSegments,
    #[error("no segment starts within {0} days")]
    NoUpcomingChange(i64),
    #[error(transparent)]
    Location(#[from] LocationError),
}

/// The outcome of one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleResult {
    pub active_index: usize,
    pub active_image: PathBuf,
    pub active_since: DateTime<Tz>,
    pub next_index: usize,
    pub next_change_at: DateTime<Tz>,
    /// Set when the active anchor's solar event did not occur that day.
    pub fallback: Option<AnchorFallback>,
}

impl ScheduleResult {
    pub fn fallback_applied(&self) -> bool {
        self.fallback.is_some()
    }

    /// Time left until `next_change_at`, zero if already past.
    pub fn time_until_change<Z: TimeZone>(&self, now: &DateTime<Z>) -> std::time::Duration {
        (self.next_change_at.with_timezone(&chrono::Utc) - now.with_timezone(&chrono::Utc))
            .to_std()
            .unwrap_or_default()
    }
}

fn resolve_day(
    model: &SegmentModel,
    location: &Location,
    date: NaiveDate,
    calculator: &dyn SolarCalculator,
) -> Result<Vec<ResolvedAnchor>, ScheduleError> {
    let events = calculator.resolve_events(date, location)?;
    Ok(model.resolve_for_date(&events, location))
}

/// Anchors for one local date, sorted by instant.
pub fn timeline(
    model: &SegmentModel,
    location: &Location,
    date: NaiveDate,
    calculator: &dyn SolarCalculator,
) -> Result<Vec<ResolvedAnchor>, ScheduleError> {
    if model.is_empty() {
        return Err(ScheduleError::NoSegments);
    }
    resolve_day(model, location, date, calculator)
}

/// First-declared anchor among those sharing the latest instant at or before `now`.
fn floor<'a>(anchors: &'a [ResolvedAnchor], now: &DateTime<Tz>) -> Option<&'a ResolvedAnchor> {
    let latest = anchors.iter().filter(|a| a.at <= *now).map(|a| a.at).max()?;
    anchors.iter().find(|a| a.at == latest)
}

fn sort_timeline(anchors: &mut [ResolvedAnchor]) {
    anchors.sort_by(|a, b| {
        a.at.cmp(&b.at)
            .then(a.segment_index.cmp(&b.segment_index))
    });
}

/// Resolve the active segment at `now`.
pub fn resolve<Z: TimeZone>(
    model: &SegmentModel,
    location: &Location,
    now: &DateTime<Z>,
    calculator: &dyn SolarCalculator,
) -> Result<ScheduleResult, ScheduleError> {
    if model.is_empty() {
        return Err(ScheduleError::NoSegments);
    }

    let now = now.with_timezone(&location.timezone());
    let today = now.date_naive();
    let yesterday = today - Duration::days(1);
    let reach = model.offset_reach();

    let mut first = yesterday;
    let mut last = today + Duration::days(1);
    let mut anchors = Vec::with_capacity(model.len() * 3);
    let mut day = first;
    while day <= last {
        anchors.extend(resolve_day(model, location, day, calculator)?);
        day += Duration::days(1);
    }
    sort_timeline(&mut anchors);

    // Anchors of an earlier date all lie before `start_of_day(first) + reach`.
    // Widen the window until the floor is out of their range, so large positive
    // offsets from earlier days are seen.
    while (today - first).num_days() < MAX_LOOKAHEAD_DAYS
        && floor(&anchors, &now).is_none_or(|a| a.at < location.start_of_day(first) + reach)
    {
        first -= Duration::days(1);
        anchors.extend(resolve_day(model, location, first, calculator)?);
        sort_timeline(&mut anchors);
    }

    let active = match floor(&anchors, &now) {
        Some(active) => active.clone(),
        None => anchors
            .iter()
            .filter(|a| a.date == yesterday)
            .max_by(|a, b| a.at.cmp(&b.at).then(b.segment_index.cmp(&a.segment_index)))
            .cloned()
            .ok_or(ScheduleError::NoSegments)?,
    };

    // Same on the other side: a later date can only contribute anchors from
    // `start_of_day(last + 1) - reach` on.
    loop {
        let next = anchors.iter().find(|a| a.at > now);
        let horizon = location.start_of_day(last + Duration::days(1)) - reach;
        if next.is_some_and(|a| a.at < horizon) {
            break;
        }
        if (last - today).num_days() >= MAX_LOOKAHEAD_DAYS {
            if next.is_some() {
                break;
            }
            return Err(ScheduleError::NoUpcomingChange(MAX_LOOKAHEAD_DAYS));
        }
        last += Duration::days(1);
        anchors.extend(resolve_day(model, location, last, calculator)?);
        sort_timeline(&mut anchors);
    }
    let next = anchors
        .iter()
        .find(|a| a.at > now)
        .cloned()
        .ok_or(ScheduleError::NoUpcomingChange(MAX_LOOKAHEAD_DAYS))?;

    let active_image = model
        .image(active.segment_index)
        .map(|p| p.to_path_buf())
        .ok_or(ScheduleError::NoSegments)?;

    Ok(ScheduleResult {
        active_index: active.segment_index,
        active_image,
        active_since: active.at,
        next_index: next.segment_index,
        next_change_at: next.at,
        fallback: active.fallback,
    })
}
