//! Configuration system for circadianr.
//!
//! Handles the TOML configuration file, default value fallback, validation,
//! and the parsed exclusion lists that scope automatic control.
//!
//! ## Configuration file
//!
//! The configuration lives at `XDG_CONFIG_HOME/circadianr/circadianr.toml`
//! (overridable with `--config <dir>`) and is created from a commented
//! template on first run:
//!
//! ```toml
//! #[Accessory]
//! name = "circadianr"          # Accessory name, namespaces persisted state
//!
//! #[Location]
//! latitude = 51.509865         # Geographic latitude
//! longitude = -0.118092        # Geographic longitude
//!
//! #[Curve]
//! min_brightness = 50          # Brightness percent at solar midnight (1-100)
//! max_brightness = 100         # Brightness percent during daylight (1-100)
//! min_colortemp = 2200         # Color temperature at the horizon, Kelvin
//! max_colortemp = 6500         # Color temperature at solar noon, Kelvin
//!
//! #[Sleep]
//! sleep_brightness = 25        # Brightness percent while sleep mode is on
//! sleep_colortemp = 2000       # Color temperature while sleep mode is on
//!
//! #[Reconciliation]
//! update_interval = 90         # Seconds between writes to one fixture
//! poll_interval = 0.5          # Seconds between bridge polling cycles
//!
//! #[Exclusions]                # Comma-separated fixture ids, "-1" = all
//! exclude_lights = ""
//! exclude_brightness = ""
//! exclude_colortemp = ""
//! exclude_manual_override = ""
//!
//! #[Bridge]
//! bridge_address = "192.168.1.2"
//! bridge_username = "..."
//! ```
//!
//! ## Default fallback
//!
//! Every numeric setting is lenient: a missing key or a value that does not
//! parse as a number silently falls back to its documented default. Only the
//! bridge address and username are required, and only structurally invalid
//! TOML or out-of-range values are load errors.

pub mod loading;
pub mod validation;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Deserializer, de::IgnoredAny};
use std::collections::HashSet;
use std::str::FromStr;

use crate::constants::*;

// Re-export public API
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Configuration for the circadianr daemon.
///
/// Most fields are optional; callers resolve them against the documented
/// defaults in [`crate::constants`].
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Accessory name; also namespaces the persisted mode record.
    pub name: Option<String>,

    /// Geographic latitude in degrees (-90 to +90).
    #[serde(default, deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,
    /// Geographic longitude in degrees (-180 to +180).
    #[serde(default, deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,

    /// Minimum seconds between automatic writes to a single fixture.
    #[serde(default, deserialize_with = "lenient_number")]
    pub update_interval: Option<u64>,
    /// Seconds between bridge polling cycles; 0 disables the monitor loop.
    #[serde(default, deserialize_with = "lenient_number")]
    pub poll_interval: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub min_brightness: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max_brightness: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub min_colortemp: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max_colortemp: Option<u32>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub sleep_brightness: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sleep_colortemp: Option<u32>,

    /// Fixtures removed from automatic control entirely.
    pub exclude_lights: Option<String>,
    /// Fixtures whose brightness is never driven or override-checked.
    pub exclude_brightness: Option<String>,
    /// Fixtures whose color temperature is never driven or override-checked.
    pub exclude_colortemp: Option<String>,
    /// Fixtures never flagged as manually overridden regardless of drift.
    pub exclude_manual_override: Option<String>,

    /// Bridge host or address. Required, no default.
    pub bridge_address: Option<String>,
    /// Bridge API credential. Required, no default.
    pub bridge_username: Option<String>,
}

/// One parsed exclusion list: an explicit id set plus the "-1" catch-all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    all: bool,
    ids: HashSet<u32>,
}

impl ExclusionList {
    /// Parse a comma-separated id list; unparseable entries are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut list = Self::default();
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if token == EXCLUDE_ALL_SENTINEL {
                list.all = true;
            } else if let Ok(id) = token.parse() {
                list.ids.insert(id);
            }
        }
        list
    }

    pub fn contains(&self, id: u32) -> bool {
        self.all || self.ids.contains(&id)
    }

    pub fn excludes_all(&self) -> bool {
        self.all
    }
}

/// The four exclusion axes, parsed once at startup.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    /// Fully excluded from tracking.
    pub lights: ExclusionList,
    pub brightness: ExclusionList,
    pub colortemp: ExclusionList,
    pub manual_override: ExclusionList,
}

impl Config {
    /// Parse the configured exclusion lists.
    pub fn exclusions(&self) -> Exclusions {
        Exclusions {
            lights: ExclusionList::parse(self.exclude_lights.as_deref().unwrap_or("")),
            brightness: ExclusionList::parse(self.exclude_brightness.as_deref().unwrap_or("")),
            colortemp: ExclusionList::parse(self.exclude_colortemp.as_deref().unwrap_or("")),
            manual_override: ExclusionList::parse(
                self.exclude_manual_override.as_deref().unwrap_or(""),
            ),
        }
    }

    /// Log the effective configuration, defaults resolved.
    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        log_indented!("name: {}", self.name.as_deref().unwrap_or(DEFAULT_NAME));
        log_indented!(
            "coordinates: {:.4}, {:.4}",
            self.latitude.unwrap_or(DEFAULT_LATITUDE),
            self.longitude.unwrap_or(DEFAULT_LONGITUDE)
        );
        log_indented!(
            "brightness: {}% - {}%",
            self.min_brightness.unwrap_or(DEFAULT_MIN_BRIGHTNESS),
            self.max_brightness.unwrap_or(DEFAULT_MAX_BRIGHTNESS)
        );
        log_indented!(
            "color temperature: {}K - {}K",
            self.min_colortemp.unwrap_or(DEFAULT_MIN_COLORTEMP),
            self.max_colortemp.unwrap_or(DEFAULT_MAX_COLORTEMP)
        );
        log_indented!(
            "sleep: {}% @ {}K",
            self.sleep_brightness.unwrap_or(DEFAULT_SLEEP_BRIGHTNESS),
            self.sleep_colortemp.unwrap_or(DEFAULT_SLEEP_COLORTEMP)
        );
        log_indented!(
            "update interval: {}s, poll interval: {}s",
            self.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL),
            self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL)
        );
        log_indented!(
            "bridge: {}",
            self.bridge_address.as_deref().unwrap_or("<unset>")
        );

        for (label, raw) in [
            ("excluded fixtures", &self.exclude_lights),
            ("brightness exclusions", &self.exclude_brightness),
            ("colortemp exclusions", &self.exclude_colortemp),
            ("override exclusions", &self.exclude_manual_override),
        ] {
            if let Some(raw) = raw
                && !raw.trim().is_empty()
            {
                log_indented!("{label}: {raw}");
            }
        }
    }
}

/// Accept a number, a numeric string, or silently fall back to `None`.
///
/// Implements the lenient numeric handling of the configuration surface: a
/// non-numeric value behaves exactly like a missing one.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Number(T),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Number(value) => Some(value),
        Lenient::Text(text) => text.trim().parse().ok(),
        Lenient::Other(_) => None,
    })
}
