//! Configuration validation.

use anyhow::{Result, bail};

use super::{Backend, Config};
use crate::common::constants::*;
use crate::geo::location::parse_timezone;

/// Reject configurations the service cannot run with.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(pack) = &config.pack
        && pack.trim().is_empty()
    {
        bail!("pack must name a pack or a pack directory");
    }

    if let Some(max_sleep) = config.max_sleep
        && !(MINIMUM_MAX_SLEEP..=MAXIMUM_MAX_SLEEP).contains(&max_sleep)
    {
        bail!(
            "max_sleep ({} seconds) must be between {} and {} seconds",
            max_sleep,
            MINIMUM_MAX_SLEEP,
            MAXIMUM_MAX_SLEEP
        );
    }

    if config.backend == Some(Backend::Command) {
        match config.command.as_deref().map(str::trim) {
            None | Some("") => bail!("backend = \"command\" requires a command, e.g. command = \"swww img {COMMAND_IMAGE_PLACEHOLDER}\""),
            Some(_) => {}
        }
    }

    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    match (config.latitude, config.longitude) {
        (Some(_), None) => bail!("latitude is set but longitude is missing"),
        (None, Some(_)) => bail!("longitude is set but latitude is missing"),
        _ => {}
    }

    if let Some(tz) = &config.timezone {
        parse_timezone(tz)?;
    }

    Ok(())
}
