//! Time source abstraction for real and test-controlled time.
//!
//! The daemon reads the current time once per reconciliation cycle. Routing
//! that read through a trait keeps time-dependent logic testable without
//! waiting for actual time to pass.

use chrono::{DateTime, Local};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Global time source instance, defaults to RealTimeSource
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting the current-time read
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Local>;
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Time source pinned to a settable instant, for tests.
#[cfg(any(test, feature = "testing-support"))]
pub struct FrozenTimeSource {
    instant: std::sync::Mutex<DateTime<Local>>,
}

#[cfg(any(test, feature = "testing-support"))]
impl FrozenTimeSource {
    pub fn new(instant: DateTime<Local>) -> Self {
        Self {
            instant: std::sync::Mutex::new(instant),
        }
    }

    /// Move the frozen clock to a new instant.
    pub fn set(&self, instant: DateTime<Local>) {
        *self.instant.lock().unwrap() = instant;
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for FrozenTimeSource {
    fn now(&self) -> DateTime<Local> {
        *self.instant.lock().unwrap()
    }
}

/// Install a time source for the lifetime of the process.
///
/// May only be called once, before the first `now()`; later calls are
/// ignored because the source is already pinned.
pub fn init(source: Arc<dyn TimeSource>) {
    let _ = TIME_SOURCE.set(source);
}

/// Get the current time from the active time source.
pub fn now() -> DateTime<Local> {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn frozen_source_reports_and_moves_its_instant() {
        let start = Local.with_ymd_and_hms(2025, 6, 21, 8, 0, 0).unwrap();
        let frozen = FrozenTimeSource::new(start);
        assert_eq!(frozen.now(), start);

        let later = start + chrono::Duration::hours(3);
        frozen.set(later);
        assert_eq!(frozen.now(), later);
    }

    #[test]
    fn global_source_pins_on_first_init() {
        let instant = Local.with_ymd_and_hms(2025, 6, 21, 12, 0, 0).unwrap();
        init(Arc::new(FrozenTimeSource::new(instant)));
        assert_eq!(now(), instant);

        // A second init is ignored; the first source stays pinned
        init(Arc::new(RealTimeSource));
        assert_eq!(now(), instant);
    }
}
