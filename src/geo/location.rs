//! Where the schedule is evaluated: coordinates plus an IANA timezone.
//!
//! All wall-clock to instant conversions go through [`Location::localize`] so that
//! daylight-saving gaps and overlaps are handled in exactly one place.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use std::fmt;
use thiserror::Error;
use tzf_rs::DefaultFinder;

static TZ_FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Invalid coordinates or an unresolvable timezone.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("latitude must be between -90 and 90 degrees (got {0})")]
    InvalidLatitude(f64),
    #[error("longitude must be between -180 and 180 degrees (got {0})")]
    InvalidLongitude(f64),
    #[error("unknown timezone '{0}' (expected an IANA name such as Europe/London)")]
    UnknownTimezone(String),
}

/// A validated location. Immutable for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    latitude: f64,
    longitude: f64,
    timezone: Tz,
    has_coordinates: bool,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timezone: Tz) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::InvalidLongitude(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
            timezone,
            has_coordinates: true,
        })
    }

    /// Build from coordinates and an optional timezone name. Without a name the
    /// zone is looked up from the coordinates.
    pub fn resolve(
        latitude: f64,
        longitude: f64,
        timezone: Option<&str>,
    ) -> Result<Self, LocationError> {
        let tz = match timezone {
            Some(name) => parse_timezone(name)?,
            None => {
                // Validate first so the lookup never sees garbage.
                Self::new(latitude, longitude, Tz::UTC)?;
                timezone_from_coordinates(latitude, longitude)
            }
        };
        Self::new(latitude, longitude, tz)
    }

    /// A location that only knows its timezone. Solar events for it come from the
    /// fixed fallback table.
    pub fn timezone_only(timezone: Tz) -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            timezone,
            has_coordinates: false,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn has_coordinates(&self) -> bool {
        self.has_coordinates
    }

    /// Turn a wall-clock time on `date` into an instant in this location's zone.
    ///
    /// Ambiguous times (clocks going back) take the earlier instant. Times that do
    /// not exist (clocks going forward) keep the offset in force before the jump,
    /// which moves them later by the length of the gap.
    pub fn localize(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
        let naive = date.and_time(time);
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                let before_gap = naive - Duration::hours(3);
                let offset = self
                    .timezone
                    .offset_from_local_datetime(&before_gap)
                    .earliest()
                    .map(|o| o.fix().local_minus_utc())
                    .unwrap_or(0);
                let utc = naive - Duration::seconds(i64::from(offset));
                self.timezone.from_utc_datetime(&utc)
            }
        }
    }

    /// First instant of `date` in this location's zone.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Tz> {
        self.localize(date, NaiveTime::MIN)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_coordinates {
            let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
            let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
            write!(
                f,
                "{:.4}°{ns}, {:.4}°{ew} ({})",
                self.latitude.abs(),
                self.longitude.abs(),
                self.timezone
            )
        } else {
            write!(f, "{} (no coordinates)", self.timezone)
        }
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, LocationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| LocationError::UnknownTimezone(name.to_string()))
}

/// Timezone at the given coordinates, UTC over open water.
pub fn timezone_from_coordinates(latitude: f64, longitude: f64) -> Tz {
    TZ_FINDER
        .get_tz_name(longitude, latitude)
        .parse::<Tz>()
        .unwrap_or(Tz::UTC)
}

/// The machine's configured timezone: `$TZ`, then the `/etc/localtime` link,
/// then `/etc/timezone`, then UTC.
pub fn system_timezone() -> Tz {
    if let Ok(name) = std::env::var("TZ")
        && let Ok(tz) = parse_timezone(name.trim_start_matches(':'))
    {
        return tz;
    }

    if let Ok(target) = std::fs::read_link("/etc/localtime") {
        let target = target.to_string_lossy();
        if let Some((_, name)) = target.split_once("zoneinfo/")
            && let Ok(tz) = parse_timezone(name)
        {
            return tz;
        }
    }

    std::fs::read_to_string("/etc/timezone")
        .ok()
        .and_then(|name| parse_timezone(&name).ok())
        .unwrap_or(Tz::UTC)
}
