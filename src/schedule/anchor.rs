//! Segment start points: fixed clock times, offsets from solar events, or a time
//! on one weekday.

use chrono::{NaiveTime, Timelike, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::common::constants::MAX_OFFSET_MINUTES;
use crate::geo::SolarEvent;

static CLOCK_24H: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("valid regex"));

static CLOCK_12H: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})\s*(am|pm)$").expect("valid regex"));

static SOLAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z][a-z_\-]*)\s*(?:([+-])\s*(\d+)\s*m?)?$").expect("valid regex")
});

/// Where a segment starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Local wall-clock time, the same every day.
    Clock { time: NaiveTime },
    /// A solar event shifted by a signed number of minutes.
    Solar {
        event: SolarEvent,
        offset_minutes: i64,
    },
    /// Local wall-clock time on one day of the week. Other days have no anchor.
    Weekly { weekday: Weekday, time: NaiveTime },
}

impl Anchor {
    pub fn clock(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|time| Anchor::Clock { time })
    }

    pub fn solar(event: SolarEvent, offset_minutes: i64) -> Self {
        Anchor::Solar {
            event,
            offset_minutes,
        }
    }

    pub fn weekly(weekday: Weekday, time: NaiveTime) -> Self {
        Anchor::Weekly { weekday, time }
    }

    /// The solar event this anchor depends on, if any.
    pub fn event(&self) -> Option<SolarEvent> {
        match self {
            Anchor::Clock { .. } | Anchor::Weekly { .. } => None,
            Anchor::Solar { event, .. } => Some(*event),
        }
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Clock { time } if time.second() == 0 => write!(f, "{}", time.format("%H:%M")),
            Anchor::Clock { time } => write!(f, "{}", time.format("%H:%M:%S")),
            Anchor::Solar {
                event,
                offset_minutes: 0,
            } => write!(f, "{event}"),
            Anchor::Solar {
                event,
                offset_minutes,
            } => write!(f, "{event}{offset_minutes:+}m"),
            Anchor::Weekly { weekday, time } => {
                write!(f, "{} {}", weekday_name(*weekday), time.format("%H:%M"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorParseError {
    #[error("empty start time")]
    Empty,
    #[error("'{0}' is not a valid clock time")]
    InvalidClock(String),
    #[error("unknown solar event '{0}' (expected e.g. sunrise, sunset, dusk, noon)")]
    UnknownEvent(String),
    #[error("offset of {minutes} minutes in '{input}' exceeds one day")]
    OffsetOutOfRange { input: String, minutes: i64 },
    #[error("cannot parse '{0}' (expected HH:MM, h:MM am/pm or an event like sunset-30)")]
    Malformed(String),
}

fn parse_number(digits: &str, input: &str) -> Result<u32, AnchorParseError> {
    digits
        .parse()
        .map_err(|_| AnchorParseError::InvalidClock(input.to_string()))
}

fn clock_anchor(hour: u32, minute: u32, second: u32, input: &str) -> Result<Anchor, AnchorParseError> {
    NaiveTime::from_hms_opt(hour, minute, second)
        .map(|time| Anchor::Clock { time })
        .ok_or_else(|| AnchorParseError::InvalidClock(input.to_string()))
}

impl FromStr for Anchor {
    type Err = AnchorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        if input.is_empty() {
            return Err(AnchorParseError::Empty);
        }

        if let Some(caps) = CLOCK_24H.captures(&input) {
            let hour = parse_number(&caps[1], s)?;
            let minute = parse_number(&caps[2], s)?;
            let second = match caps.get(3) {
                Some(m) => parse_number(m.as_str(), s)?,
                None => 0,
            };
            return clock_anchor(hour, minute, second, s);
        }

        if let Some(caps) = CLOCK_12H.captures(&input) {
            let hour = parse_number(&caps[1], s)?;
            let minute = parse_number(&caps[2], s)?;
            if !(1..=12).contains(&hour) {
                return Err(AnchorParseError::InvalidClock(s.to_string()));
            }
            let hour = match (&caps[3], hour) {
                ("am", 12) => 0,
                ("am", h) => h,
                ("pm", 12) => 12,
                (_, h) => h + 12,
            };
            return clock_anchor(hour, minute, 0, s);
        }

        if let Some(caps) = SOLAR.captures(&input) {
            let event: SolarEvent = caps[1]
                .parse()
                .map_err(|_| AnchorParseError::UnknownEvent(caps[1].to_string()))?;

            let offset_minutes = match (caps.get(2), caps.get(3)) {
                (Some(sign), Some(digits)) => {
                    let minutes: i64 = digits.as_str().parse().unwrap_or(i64::MAX);
                    if minutes > MAX_OFFSET_MINUTES {
                        return Err(AnchorParseError::OffsetOutOfRange {
                            input: s.trim().to_string(),
                            minutes,
                        });
                    }
                    if sign.as_str() == "-" { -minutes } else { minutes }
                }
                _ => 0,
            };

            return Ok(Anchor::Solar {
                event,
                offset_minutes,
            });
        }

        Err(AnchorParseError::Malformed(s.trim().to_string()))
    }
}
