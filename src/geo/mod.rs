//! Geographic context for the schedule.
//!
//! - [`location`]: validated coordinates, timezone lookup and DST-safe wall-clock
//!   conversion
//! - [`solar`]: solar event times per local date, astronomical or fixed
//! - [`display`]: event tables for the CLI

pub mod display;
pub mod location;
pub mod solar;

pub use display::log_solar_events;
pub use location::{Location, LocationError};
pub use solar::{
    Astronomical, EventUndefined, FixedSolarTimes, SolarCalculator, SolarEvent, SolarEvents,
    calculator_for, resolve_events,
};
