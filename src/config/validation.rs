//! Configuration validation.
//!
//! Range checks run after loading, against the resolved values (defaults
//! applied). Out-of-range values are errors with actionable messages; the
//! lenient numeric fallback in `config::mod` has already mapped malformed
//! values to their defaults before this point.

use anyhow::{Result, bail};

use super::Config;
use crate::constants::*;

/// Validate resolved configuration values.
pub fn validate_config(config: &Config) -> Result<()> {
    let latitude = config.latitude.unwrap_or(DEFAULT_LATITUDE);
    if !(-90.0..=90.0).contains(&latitude) {
        bail!("latitude must be between -90 and 90 degrees, got {latitude}");
    }

    let longitude = config.longitude.unwrap_or(DEFAULT_LONGITUDE);
    if !(-180.0..=180.0).contains(&longitude) {
        bail!("longitude must be between -180 and 180 degrees, got {longitude}");
    }

    let min_brightness = config.min_brightness.unwrap_or(DEFAULT_MIN_BRIGHTNESS);
    let max_brightness = config.max_brightness.unwrap_or(DEFAULT_MAX_BRIGHTNESS);
    for (label, value) in [
        ("min_brightness", min_brightness),
        ("max_brightness", max_brightness),
        (
            "sleep_brightness",
            config.sleep_brightness.unwrap_or(DEFAULT_SLEEP_BRIGHTNESS),
        ),
    ] {
        if !(1..=100).contains(&value) {
            bail!("{label} must be between 1 and 100 percent, got {value}");
        }
    }
    if min_brightness > max_brightness {
        bail!("min_brightness ({min_brightness}) exceeds max_brightness ({max_brightness})");
    }

    let min_colortemp = config.min_colortemp.unwrap_or(DEFAULT_MIN_COLORTEMP);
    let max_colortemp = config.max_colortemp.unwrap_or(DEFAULT_MAX_COLORTEMP);
    for (label, value) in [
        ("min_colortemp", min_colortemp),
        ("max_colortemp", max_colortemp),
        (
            "sleep_colortemp",
            config.sleep_colortemp.unwrap_or(DEFAULT_SLEEP_COLORTEMP),
        ),
    ] {
        if !(MIN_COLORTEMP_KELVIN..=MAX_COLORTEMP_KELVIN).contains(&value) {
            bail!(
                "{label} must be between {MIN_COLORTEMP_KELVIN} and {MAX_COLORTEMP_KELVIN} Kelvin, got {value}"
            );
        }
    }
    if min_colortemp > max_colortemp {
        bail!("min_colortemp ({min_colortemp}) exceeds max_colortemp ({max_colortemp})");
    }

    if config.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL) == 0 {
        bail!("update_interval must be at least 1 second");
    }

    let poll_interval = config.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
    if !poll_interval.is_finite() || poll_interval < 0.0 {
        bail!("poll_interval must be a non-negative number of seconds, got {poll_interval}");
    }

    match config.bridge_address.as_deref() {
        Some(address) if !address.trim().is_empty() => {}
        _ => bail!("bridge_address is required and has no default"),
    }
    match config.bridge_username.as_deref() {
        Some(username) if !username.trim().is_empty() => {}
        _ => bail!("bridge_username is required and has no default"),
    }

    Ok(())
}
