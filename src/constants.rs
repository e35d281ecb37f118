//! Application-wide constants and configuration defaults.
//!
//! Any numeric setting missing from the configuration file silently falls
//! back to the default documented here.

/// Default accessory name, also the namespace for persisted mode state.
pub const DEFAULT_NAME: &str = "circadianr";

// Geographic defaults: central London
pub const DEFAULT_LATITUDE: f64 = 51.509865;
pub const DEFAULT_LONGITUDE: f64 = -0.118092;

/// Default minimum seconds between automatic writes to a single fixture.
pub const DEFAULT_UPDATE_INTERVAL: u64 = 90;

/// Default seconds between bridge polling cycles.
pub const DEFAULT_POLL_INTERVAL: f64 = 0.5;

// Brightness curve defaults, in percent
pub const DEFAULT_MIN_BRIGHTNESS: u32 = 50;
pub const DEFAULT_MAX_BRIGHTNESS: u32 = 100;

// Color temperature curve defaults, in Kelvin
pub const DEFAULT_MIN_COLORTEMP: u32 = 2200;
pub const DEFAULT_MAX_COLORTEMP: u32 = 6500;

// Sleep mode defaults
pub const DEFAULT_SLEEP_BRIGHTNESS: u32 = 25;
pub const DEFAULT_SLEEP_COLORTEMP: u32 = 2000;

// Validation bounds
pub const MIN_COLORTEMP_KELVIN: u32 = 1000;
pub const MAX_COLORTEMP_KELVIN: u32 = 20000;

/// Top of the device brightness scale (native units, not percent).
pub const DEVICE_BRIGHTNESS_MAX: u16 = 254;

/// Brightness deviation treated as a manual change, ≈10% of the device range.
pub const BRIGHTNESS_CHANGE_THRESHOLD: u16 = 25;

/// Color-temperature deviation treated as a manual change, ≈5% of the device
/// range in mireds.
pub const COLORTEMP_CHANGE_THRESHOLD: u16 = 20;

/// Sentinel accepted by every exclusion list, meaning "exclude all fixtures".
pub const EXCLUDE_ALL_SENTINEL: &str = "-1";

/// How long the supervisor waits for a signal while the controller is idle.
pub const IDLE_WAIT_SECS: u64 = 2;

// Exit codes
pub const EXIT_FAILURE: i32 = 1;
