//! Solar event times for a date and location.
//!
//! [`Astronomical`] runs the NREL SPA algorithm (via `solar-positioning`) for each
//! horizon. [`FixedSolarTimes`] returns a fixed table and is used when no
//! coordinates are configured.
//!
//! An event is reported for a date only when it happens on that *local* calendar
//! date. Near the poles, or when an event drifts across local midnight, the event
//! is missing for the day and lookups return [`EventUndefined`].

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use solar_positioning::time::DeltaT;
use solar_positioning::{Horizon, SunriseResult, spa};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::location::{Location, LocationError};

/// Named daily events a schedule anchor can refer to.
///
/// Variants are declared in the order they happen during an ordinary day, and
/// the derived `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SolarEvent {
    Midnight,
    AstronomicalDawn,
    NauticalDawn,
    /// Civil dawn, sun 6° below the horizon.
    Dawn,
    Sunrise,
    /// Solar transit.
    Noon,
    Sunset,
    /// Civil dusk, sun 6° below the horizon.
    Dusk,
    NauticalDusk,
    AstronomicalDusk,
}

impl SolarEvent {
    pub const ALL: [SolarEvent; 10] = [
        SolarEvent::Midnight,
        SolarEvent::AstronomicalDawn,
        SolarEvent::NauticalDawn,
        SolarEvent::Dawn,
        SolarEvent::Sunrise,
        SolarEvent::Noon,
        SolarEvent::Sunset,
        SolarEvent::Dusk,
        SolarEvent::NauticalDusk,
        SolarEvent::AstronomicalDusk,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SolarEvent::Midnight => "midnight",
            SolarEvent::AstronomicalDawn => "astronomical_dawn",
            SolarEvent::NauticalDawn => "nautical_dawn",
            SolarEvent::Dawn => "dawn",
            SolarEvent::Sunrise => "sunrise",
            SolarEvent::Noon => "noon",
            SolarEvent::Sunset => "sunset",
            SolarEvent::Dusk => "dusk",
            SolarEvent::NauticalDusk => "nautical_dusk",
            SolarEvent::AstronomicalDusk => "astronomical_dusk",
        }
    }

    /// Wall-clock time used when no coordinates are known.
    fn fixed_time(self) -> NaiveTime {
        let (h, m) = match self {
            SolarEvent::Midnight => (0, 0),
            SolarEvent::AstronomicalDawn => (4, 0),
            SolarEvent::NauticalDawn => (4, 30),
            SolarEvent::Dawn => (5, 0),
            SolarEvent::Sunrise => (6, 30),
            SolarEvent::Noon => (12, 0),
            SolarEvent::Sunset => (18, 30),
            SolarEvent::Dusk => (19, 30),
            SolarEvent::NauticalDusk => (20, 0),
            SolarEvent::AstronomicalDusk => (20, 30),
        };
        NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for SolarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown solar event '{0}'")]
pub struct UnknownSolarEvent(pub String);

impl FromStr for SolarEvent {
    type Err = UnknownSolarEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let event = match normalized.as_str() {
            "civil_dawn" => SolarEvent::Dawn,
            "civil_dusk" => SolarEvent::Dusk,
            "solar_noon" => SolarEvent::Noon,
            other => SolarEvent::ALL
                .into_iter()
                .find(|event| event.name() == other)
                .ok_or_else(|| UnknownSolarEvent(s.to_string()))?,
        };
        Ok(event)
    }
}

/// A solar event that does not happen on the requested date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{event} does not occur on {date}")]
pub struct EventUndefined {
    pub event: SolarEvent,
    pub date: NaiveDate,
}

/// Event times for one local date. Missing entries mean the event does not occur.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarEvents {
    date: NaiveDate,
    times: BTreeMap<SolarEvent, DateTime<Tz>>,
}

impl SolarEvents {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            times: BTreeMap::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn set(&mut self, event: SolarEvent, at: Option<DateTime<Tz>>) {
        match at {
            Some(at) => {
                self.times.insert(event, at);
            }
            None => {
                self.times.remove(&event);
            }
        }
    }

    pub fn get(&self, event: SolarEvent) -> Result<DateTime<Tz>, EventUndefined> {
        self.times
            .get(&event)
            .copied()
            .ok_or(EventUndefined {
                event,
                date: self.date,
            })
    }

    pub fn is_defined(&self, event: SolarEvent) -> bool {
        self.times.contains_key(&event)
    }

    /// Every supported event in daily order with its time, if any.
    pub fn iter(&self) -> impl Iterator<Item = (SolarEvent, Option<DateTime<Tz>>)> + '_ {
        SolarEvent::ALL
            .into_iter()
            .map(|event| (event, self.times.get(&event).copied()))
    }
}

/// Source of solar event times.
pub trait SolarCalculator: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve_events(
        &self,
        date: NaiveDate,
        location: &Location,
    ) -> Result<SolarEvents, LocationError>;
}

/// Pick the calculator matching what the location knows.
pub fn calculator_for(location: &Location) -> Box<dyn SolarCalculator> {
    if location.has_coordinates() {
        Box::new(Astronomical)
    } else {
        Box::new(FixedSolarTimes)
    }
}

/// Fixed wall-clock times, identical every day.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSolarTimes;

impl SolarCalculator for FixedSolarTimes {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn resolve_events(
        &self,
        date: NaiveDate,
        location: &Location,
    ) -> Result<SolarEvents, LocationError> {
        let mut events = SolarEvents::new(date);
        for event in SolarEvent::ALL {
            events.set(event, Some(location.localize(date, event.fixed_time())));
        }
        Ok(events)
    }
}

/// SPA-based calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Astronomical;

/// Horizons and the events their rising and setting crossings produce.
const HORIZONS: [(Horizon, SolarEvent, SolarEvent); 4] = [
    (Horizon::SunriseSunset, SolarEvent::Sunrise, SolarEvent::Sunset),
    (Horizon::CivilTwilight, SolarEvent::Dawn, SolarEvent::Dusk),
    (Horizon::NauticalTwilight, SolarEvent::NauticalDawn, SolarEvent::NauticalDusk),
    (
        Horizon::AstronomicalTwilight,
        SolarEvent::AstronomicalDawn,
        SolarEvent::AstronomicalDusk,
    ),
];

/// Used when ΔT cannot be estimated for the date.
const FALLBACK_DELTA_T: f64 = 69.0;

impl Astronomical {
    /// SPA results for the UTC days around `date`. A local date overlaps at most
    /// three UTC days, so the wanted crossings are always among these.
    fn crossings(
        date: NaiveDate,
        location: &Location,
        horizon: Horizon,
        delta_t: f64,
    ) -> Result<Vec<SunriseResult<DateTime<Utc>>>, LocationError> {
        let mut results = Vec::with_capacity(3);
        for offset in -1..=1 {
            let day = date + Duration::days(offset);
            let utc_midnight = day.and_time(NaiveTime::MIN).and_utc();
            match spa::sunrise_sunset_for_horizon(
                utc_midnight,
                location.latitude(),
                location.longitude(),
                delta_t,
                horizon,
            ) {
                Ok(result) => results.push(result),
                Err(solar_positioning::Error::InvalidLatitude { value }) => {
                    return Err(LocationError::InvalidLatitude(value));
                }
                Err(solar_positioning::Error::InvalidLongitude { value }) => {
                    return Err(LocationError::InvalidLongitude(value));
                }
                // Any other failure only leaves this day's crossings undefined.
                Err(_) => {}
            }
        }
        Ok(results)
    }
}

impl SolarCalculator for Astronomical {
    fn name(&self) -> &'static str {
        "astronomical"
    }

    fn resolve_events(
        &self,
        date: NaiveDate,
        location: &Location,
    ) -> Result<SolarEvents, LocationError> {
        let tz = location.timezone();
        let delta_t = DeltaT::estimate_from_date_like(date).unwrap_or(FALLBACK_DELTA_T);
        let on_date = |t: &DateTime<Utc>| t.with_timezone(&tz).date_naive() == date;
        let first_on_date = |candidates: Vec<&DateTime<Utc>>| {
            candidates
                .into_iter()
                .find(|t| on_date(*t))
                .map(|t| t.with_timezone(&tz))
        };

        let mut events = SolarEvents::new(date);
        events.set(SolarEvent::Midnight, Some(location.start_of_day(date)));

        for (horizon, rising, setting) in HORIZONS {
            let days = Self::crossings(date, location, horizon, delta_t)?;

            events.set(rising, first_on_date(days.iter().filter_map(|d| d.sunrise()).collect()));
            events.set(setting, first_on_date(days.iter().filter_map(|d| d.sunset()).collect()));

            if horizon == Horizon::SunriseSunset {
                events.set(
                    SolarEvent::Noon,
                    first_on_date(days.iter().map(|d| d.transit()).collect()),
                );
            }
        }

        Ok(events)
    }
}

/// Convenience wrapper used by commands that only need one day's events.
pub fn resolve_events(date: NaiveDate, location: &Location) -> Result<SolarEvents, LocationError> {
    calculator_for(location).resolve_events(date, location)
}

/// Render an optional event time for tables.
pub fn format_event_time(at: Option<DateTime<Tz>>) -> String {
    at.map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

