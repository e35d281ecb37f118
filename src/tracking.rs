//! Per-fixture tracking state.
//!
//! One [`FixtureRecord`] exists for every fixture under automatic control,
//! keyed by fixture id and owned exclusively by the [`Tracker`]. The tracker
//! is rebuilt from scratch on every enable-triggered discovery pass, so stale
//! records never survive a disable/enable cycle. Only the reconciliation
//! engine mutates it, and every mutation runs to completion before the engine
//! yields, so there are no torn reads between a classification and the write
//! it decides.

use chrono::{DateTime, Local};
use std::collections::HashMap;

/// Which attributes a fixture can be driven through, fixed at discovery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    None,
    BrightnessOnly,
    ColorTempOnly,
    Both,
}

impl Capability {
    /// Derive a capability from the attribute set a fixture reports.
    pub fn from_attributes(brightness: bool, colortemp: bool) -> Self {
        match (brightness, colortemp) {
            (true, true) => Capability::Both,
            (true, false) => Capability::BrightnessOnly,
            (false, true) => Capability::ColorTempOnly,
            (false, false) => Capability::None,
        }
    }

    pub fn has_brightness(self) -> bool {
        matches!(self, Capability::Both | Capability::BrightnessOnly)
    }

    pub fn has_colortemp(self) -> bool {
        matches!(self, Capability::Both | Capability::ColorTempOnly)
    }
}

/// Tracking record for one fixture.
///
/// `None` in the value fields and the timestamp is the "never reconciled"
/// sentinel: the next pass accepts whatever state it observes and applies
/// targets immediately, bypassing the cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRecord {
    /// Last brightness this daemon applied or observed as consistent,
    /// in native device units.
    pub last_brightness: Option<u16>,
    /// Same, in mireds.
    pub last_colortemp: Option<u16>,
    pub capability: Capability,
    /// Set once a human-caused deviation is detected; suppresses automatic
    /// writes until the fixture is observed off or unreachable.
    pub manual_override: bool,
    pub last_reconciled: Option<DateTime<Local>>,
}

impl FixtureRecord {
    pub fn new(capability: Capability) -> Self {
        Self {
            last_brightness: None,
            last_colortemp: None,
            capability,
            manual_override: false,
            last_reconciled: None,
        }
    }

    /// Return to sentinel defaults, keeping the discovered capability.
    ///
    /// Used when an overridden fixture is observed off or unreachable: the
    /// next time it powers on, control resumes as if freshly discovered.
    pub fn reset(&mut self) {
        self.last_brightness = None;
        self.last_colortemp = None;
        self.manual_override = false;
        self.last_reconciled = None;
    }
}

/// Owner of the per-fixture tracking map.
#[derive(Debug, Default)]
pub struct Tracker {
    fixtures: HashMap<u32, FixtureRecord>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record ahead of a discovery pass.
    pub fn clear(&mut self) {
        self.fixtures.clear();
    }

    /// Insert a freshly discovered fixture.
    ///
    /// Callers must not insert `Capability::None` fixtures; discovery filters
    /// them out before this point.
    pub fn insert(&mut self, id: u32, capability: Capability) {
        debug_assert!(capability != Capability::None);
        self.fixtures.insert(id, FixtureRecord::new(capability));
    }

    pub fn contains(&self, id: u32) -> bool {
        self.fixtures.contains_key(&id)
    }

    pub fn get(&self, id: u32) -> Option<&FixtureRecord> {
        self.fixtures.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut FixtureRecord> {
        self.fixtures.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Force the next cycle to update every non-overridden fixture
    /// immediately, bypassing the per-fixture cooldown.
    ///
    /// Used when sleep mode toggles so the sleep targets apply on the next
    /// poll rather than after the update interval elapses.
    pub fn expire_cooldowns(&mut self) {
        for record in self.fixtures.values_mut() {
            if !record.manual_override {
                record.last_reconciled = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn capability_from_attribute_sets() {
        assert_eq!(Capability::from_attributes(true, true), Capability::Both);
        assert_eq!(
            Capability::from_attributes(true, false),
            Capability::BrightnessOnly
        );
        assert_eq!(
            Capability::from_attributes(false, true),
            Capability::ColorTempOnly
        );
        assert_eq!(Capability::from_attributes(false, false), Capability::None);
        assert!(Capability::Both.has_brightness());
        assert!(Capability::Both.has_colortemp());
        assert!(!Capability::ColorTempOnly.has_brightness());
    }

    #[test]
    fn reset_returns_to_sentinel_defaults_keeping_capability() {
        let mut record = FixtureRecord::new(Capability::Both);
        record.last_brightness = Some(200);
        record.last_colortemp = Some(250);
        record.manual_override = true;
        record.last_reconciled = Some(Local.with_ymd_and_hms(2025, 6, 21, 12, 0, 0).unwrap());

        record.reset();

        assert_eq!(record, FixtureRecord::new(Capability::Both));
    }

    #[test]
    fn expire_cooldowns_skips_overridden_fixtures() {
        let stamp = Local.with_ymd_and_hms(2025, 6, 21, 12, 0, 0).unwrap();
        let mut tracker = Tracker::new();
        tracker.insert(1, Capability::Both);
        tracker.insert(2, Capability::BrightnessOnly);
        tracker.get_mut(1).unwrap().last_reconciled = Some(stamp);
        let overridden = tracker.get_mut(2).unwrap();
        overridden.last_reconciled = Some(stamp);
        overridden.manual_override = true;

        tracker.expire_cooldowns();

        assert_eq!(tracker.get(1).unwrap().last_reconciled, None);
        assert_eq!(tracker.get(2).unwrap().last_reconciled, Some(stamp));
    }

    #[test]
    fn rebuild_replaces_all_records() {
        let mut tracker = Tracker::new();
        tracker.insert(1, Capability::Both);
        tracker.insert(2, Capability::ColorTempOnly);
        tracker.clear();
        tracker.insert(3, Capability::BrightnessOnly);

        assert!(!tracker.contains(1));
        assert!(!tracker.contains(2));
        assert_eq!(tracker.len(), 1);
    }
}
