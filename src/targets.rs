//! Target brightness and color-temperature resolution.
//!
//! Maps the normalized sun position (plus sleep mode) to the values the
//! fixtures should hold right now. Brightness stays clamped to the configured
//! maximum for the whole daylight half of the curve and interpolates linearly
//! across the night trough; color temperature ramps linearly across daylight
//! and sits flat at the warm minimum all night. Sleep mode bypasses the curve
//! entirely.
//!
//! Resolved targets are percent/Kelvin; [`DeviceTargets`] carries the same
//! values in native device units (254-scale brightness, mireds).

use crate::config::Config;
use crate::constants::*;

/// Resolved targets in human units: percent brightness, Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightTargets {
    pub brightness_percent: u32,
    pub colortemp_kelvin: u32,
}

/// Resolved targets in native device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTargets {
    /// Brightness on the 254-point device scale.
    pub brightness: u16,
    /// Color temperature in mireds.
    pub colortemp: u16,
}

/// Resolve targets for a sun position, honoring sleep mode.
pub fn resolve_targets(sun_position: f64, sleep: bool, config: &Config) -> LightTargets {
    LightTargets {
        brightness_percent: brightness_percent(sun_position, sleep, config),
        colortemp_kelvin: colortemp_kelvin(sun_position, sleep, config),
    }
}

/// Brightness percent for a sun position.
///
/// Daylight (positive sun position) holds the configured maximum; the night
/// half interpolates linearly from minimum at the trough back up to maximum
/// at the horizon.
fn brightness_percent(sun_position: f64, sleep: bool, config: &Config) -> u32 {
    if sleep {
        return config.sleep_brightness.unwrap_or(DEFAULT_SLEEP_BRIGHTNESS);
    }

    let max = config.max_brightness.unwrap_or(DEFAULT_MAX_BRIGHTNESS);
    if sun_position > 0.0 {
        return max;
    }

    let min = config.min_brightness.unwrap_or(DEFAULT_MIN_BRIGHTNESS);
    let delta = max as f64 - min as f64;
    (delta * ((100.0 + sun_position) / 100.0) + min as f64).round() as u32
}

/// Color temperature in Kelvin for a sun position.
///
/// Ramps from the warm minimum at the horizon to the cool maximum at solar
/// noon; night is flat at the minimum.
fn colortemp_kelvin(sun_position: f64, sleep: bool, config: &Config) -> u32 {
    if sleep {
        return config.sleep_colortemp.unwrap_or(DEFAULT_SLEEP_COLORTEMP);
    }

    let min = config.min_colortemp.unwrap_or(DEFAULT_MIN_COLORTEMP);
    if sun_position > 0.0 {
        let max = config.max_colortemp.unwrap_or(DEFAULT_MAX_COLORTEMP);
        let delta = max as f64 - min as f64;
        return (delta * (sun_position / 100.0) + min as f64).ceil() as u32;
    }

    min
}

impl LightTargets {
    /// Convert to native device units.
    pub fn to_device_units(self) -> DeviceTargets {
        DeviceTargets {
            brightness: percent_to_device(self.brightness_percent),
            colortemp: kelvin_to_mired(self.colortemp_kelvin),
        }
    }
}

/// Percent brightness to the 254-point device scale.
pub fn percent_to_device(percent: u32) -> u16 {
    ((percent as f64 / 100.0) * DEVICE_BRIGHTNESS_MAX as f64).round() as u16
}

/// Device brightness back to percent, for logs.
pub fn device_to_percent(brightness: u16) -> u32 {
    ((brightness as f64 / DEVICE_BRIGHTNESS_MAX as f64) * 100.0).round() as u32
}

/// Kelvin to mireds.
pub fn kelvin_to_mired(kelvin: u32) -> u16 {
    (1_000_000.0 / kelvin as f64).ceil() as u16
}

/// Mireds back to Kelvin, for logs.
pub fn mired_to_kelvin(mired: u16) -> u32 {
    (1_000_000.0 / mired as f64).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config() -> Config {
        Config {
            min_brightness: Some(50),
            max_brightness: Some(100),
            min_colortemp: Some(2200),
            max_colortemp: Some(6500),
            sleep_brightness: Some(25),
            sleep_colortemp: Some(2000),
            ..Config::default()
        }
    }

    #[test]
    fn sleep_bypasses_the_curve() {
        let config = test_config();
        for position in [-100.0, -50.0, 0.0, 50.0, 100.0] {
            let targets = resolve_targets(position, true, &config);
            assert_eq!(targets.brightness_percent, 25);
            assert_eq!(targets.colortemp_kelvin, 2000);
        }
    }

    #[test]
    fn daylight_brightness_is_clamped_to_max() {
        let config = test_config();
        for position in [0.1, 1.0, 42.0, 100.0] {
            assert_eq!(
                resolve_targets(position, false, &config).brightness_percent,
                100
            );
        }
    }

    #[test]
    fn night_brightness_interpolates_the_trough() {
        let config = test_config();
        assert_eq!(resolve_targets(-100.0, false, &config).brightness_percent, 50);
        assert_eq!(resolve_targets(-50.0, false, &config).brightness_percent, 75);
        assert_eq!(resolve_targets(0.0, false, &config).brightness_percent, 100);
    }

    #[test]
    fn night_brightness_is_monotonic() {
        let config = test_config();
        let mut previous = 0;
        let mut position = -100.0;
        while position <= 0.0 {
            let value = resolve_targets(position, false, &config).brightness_percent;
            assert!(value >= previous);
            previous = value;
            position += 1.0;
        }
    }

    #[test]
    fn colortemp_ramps_across_daylight_only() {
        let config = test_config();
        assert_eq!(resolve_targets(-30.0, false, &config).colortemp_kelvin, 2200);
        assert_eq!(resolve_targets(0.0, false, &config).colortemp_kelvin, 2200);
        assert_eq!(resolve_targets(100.0, false, &config).colortemp_kelvin, 6500);
        assert_eq!(resolve_targets(50.0, false, &config).colortemp_kelvin, 4350);
    }

    #[test]
    fn device_conversions_match_documented_formulas() {
        assert_eq!(percent_to_device(100), 254);
        assert_eq!(percent_to_device(50), 127);
        assert_eq!(kelvin_to_mired(2000), 500);
        assert_eq!(kelvin_to_mired(6500), 154);
    }

    #[test]
    fn brightness_round_trip_stays_within_one_percent() {
        for percent in 0..=100 {
            let back = device_to_percent(percent_to_device(percent));
            assert!(
                (back as i64 - percent as i64).abs() <= 1,
                "{percent}% -> {back}%"
            );
        }
    }
}
