//! Weekday packs.
//!
//! A pack with `type = "days"` maps weekdays to images instead of listing
//! segments:
//!
//! ```toml
//! [meta]
//! type = "days"
//!
//! [days]
//! monday = "monday.jpg"
//! saturday = { images = ["beach.jpg", "sunset.jpg"] }
//! ```
//!
//! A day with several images splits into equal parts starting at local
//! midnight. Days that are not listed show the first listed day's images.

use chrono::{NaiveTime, TimeDelta, Weekday};
use std::path::PathBuf;
use thiserror::Error;

use crate::schedule::{Anchor, Segment, weekday_name};

const SECONDS_PER_DAY: i64 = 86_400;

/// Images of one weekday, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub weekday: Weekday,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DaysError {
    #[error("[days] lists no weekdays")]
    Empty,
    #[error("'{0}' is not a weekday")]
    UnknownDay(String),
    #[error("'{0}' must be an image name or a table with an images list")]
    InvalidEntry(String),
    #[error("'{0}' lists no images")]
    NoImages(String),
    #[error("'{0}' repeats a weekday listed earlier")]
    Duplicate(String),
}

/// Parse one `[days]` entry.
pub fn parse_entry(key: &str, value: &toml::Value) -> Result<DayEntry, DaysError> {
    let weekday: Weekday = key
        .trim()
        .parse()
        .map_err(|_| DaysError::UnknownDay(key.to_string()))?;

    let images = match value {
        toml::Value::String(image) => vec![image.clone()],
        toml::Value::Table(table) => match table.get("images") {
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| DaysError::InvalidEntry(key.to_string()))?,
            _ => return Err(DaysError::InvalidEntry(key.to_string())),
        },
        _ => return Err(DaysError::InvalidEntry(key.to_string())),
    };

    if images.iter().all(|image| image.trim().is_empty()) {
        return Err(DaysError::NoImages(key.to_string()));
    }

    Ok(DayEntry {
        weekday,
        images: images.into_iter().filter(|i| !i.trim().is_empty()).collect(),
    })
}

/// Parse the whole `[days]` table, keeping file order.
pub fn parse_days(table: &toml::Table) -> Result<Vec<DayEntry>, DaysError> {
    if table.is_empty() {
        return Err(DaysError::Empty);
    }

    let mut entries: Vec<DayEntry> = Vec::with_capacity(table.len());
    for (key, value) in table {
        let entry = parse_entry(key, value)?;
        if entries.iter().any(|e| e.weekday == entry.weekday) {
            return Err(DaysError::Duplicate(key.clone()));
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Weekdays the table does not list, Monday first.
pub fn missing_days(entries: &[DayEntry]) -> Vec<Weekday> {
    week()
        .filter(|day| entries.iter().all(|e| e.weekday != *day))
        .collect()
}

fn week() -> impl Iterator<Item = Weekday> {
    std::iter::successors(Some(Weekday::Mon), |day| match day {
        Weekday::Sun => None,
        _ => Some(day.succ()),
    })
}

/// Expand entries into one weekly segment per image for the whole week.
/// `entries` must not be empty.
pub fn week_segments(entries: &[DayEntry], resolve: impl Fn(&str) -> PathBuf) -> Vec<Segment> {
    let Some(first) = entries.first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    for day in week() {
        let images = entries
            .iter()
            .find(|e| e.weekday == day)
            .unwrap_or(first)
            .images
            .as_slice();
        let count = images.len() as i64;

        for (i, image) in images.iter().enumerate() {
            let start = NaiveTime::MIN + TimeDelta::seconds(i as i64 * SECONDS_PER_DAY / count);
            let label = if count > 1 {
                format!("{} ({}/{count})", weekday_name(day), i + 1)
            } else {
                weekday_name(day).to_string()
            };
            segments.push(Segment::new(Anchor::weekly(day, start), resolve(image)).with_label(label));
        }
    }
    segments
}
