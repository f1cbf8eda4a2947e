//! # solpaper
//!
//! Wallpaper scheduling driven by the sun. A *pack* binds images to anchors:
//! fixed clock times or solar events with optional offsets (`sunset-30`). The
//! resolver turns a pack, a location and an instant into the active image and
//! the instant of the next change. The service applies that image and sleeps
//! until then.
//!
//! ## Layout
//!
//! - [`geo`]: location, timezone handling, solar event times
//! - [`schedule`]: anchors, segments and the resolver
//! - [`pack`]: pack manifests on disk, loading and validation
//! - [`backend`]: ways of putting an image on the desktop
//! - [`config`]: `solpaper.toml`, `geo.toml`, hot reload
//! - [`Solpaper`]: service startup; the loop itself lives in `core`
//! - [`commands`]: one-shot CLI commands
//! - [`io`]: lock file, running-instance lookup, signals
//! - [`time_source`]: real or simulated clock

// Logging macros must be in scope for every module declared after this one.
#[macro_use]
pub mod common;

pub mod args;
pub mod backend;
pub mod commands;
pub mod config;
pub mod geo;
pub mod io;
pub mod pack;
pub mod schedule;
pub mod time_source;

mod core;
mod solpaper;

pub use schedule::{ScheduleError, ScheduleResult, resolve};
pub use solpaper::Solpaper;
