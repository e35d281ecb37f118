//! Per-fixture reconciliation engine.
//!
//! Runs once per poll cycle while the controller is enabled. Each cycle
//! fetches live state for every tracked fixture, classifies any deviation
//! from the tracked values as benign drift or a manual override, and either
//! pushes the freshly computed targets or steps aside.
//!
//! The classification rules, in order:
//!
//! - A fixture observed off or unreachable is never written. If it was
//!   overridden, its tracking resets so control resumes when it powers on.
//! - An overridden fixture is left alone entirely.
//! - Within the per-fixture update interval, nothing happens (cooldown).
//! - A deviation is benign when every non-excluded attribute is within its
//!   change threshold, when the fixture is on the manual-override exclusion
//!   list, or on the fixture's first-ever reconciliation.
//! - Benign: non-excluded attributes that differ from target are written;
//!   everything else passively syncs to the observed value.
//! - Otherwise the deviation is a manual override: it is recorded and no
//!   write is issued until the fixture is power-cycled.
//!
//! Bridge failures degrade per the error taxonomy: connection or enumeration
//! failures skip the cycle, per-fixture failures skip the fixture.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local};

use crate::bridge::{FixtureInfo, FixtureState, LightBridge, StateUpdate};
use crate::config::{Config, Exclusions};
use crate::constants::*;
use crate::targets::DeviceTargets;
use crate::tracking::{Capability, FixtureRecord, Tracker};

/// Outcome of comparing observed state against the tracked record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deviation {
    Benign,
    Manual,
}

/// The polling control loop's engine: owns the bridge handle and the
/// per-fixture tracking map.
pub struct ReconciliationEngine {
    bridge: Box<dyn LightBridge>,
    tracker: Tracker,
    exclusions: Exclusions,
    update_interval: Duration,
}

impl ReconciliationEngine {
    pub fn new(bridge: Box<dyn LightBridge>, config: &Config) -> Self {
        let update_interval =
            Duration::seconds(config.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL) as i64);
        Self {
            bridge,
            tracker: Tracker::new(),
            exclusions: config.exclusions(),
            update_interval,
        }
    }

    /// Enable-triggered capability discovery.
    ///
    /// Rebuilds the tracking map from scratch and logs a capability table.
    /// Fixtures that support neither attribute, and fixtures on the full
    /// exclusion list, are not tracked.
    pub fn discover(&mut self) -> Result<()> {
        self.tracker.clear();

        self.bridge.connect().context("bridge connection failed")?;
        let fixtures = self
            .bridge
            .list_fixtures()
            .context("fixture enumeration failed")?;

        log_block_start!("Discovered {} fixtures", fixtures.len());
        log_indented!("{:>3}  {:<24} Control", "ID", "Name");
        for fixture in &fixtures {
            let status = self.register_fixture(fixture);
            log_indented!("{:>3}  {:<24} [{}]", fixture.id, fixture.name, status);
        }
        log_indented!("Tracking {} fixtures", self.tracker.len());

        Ok(())
    }

    /// Insert a discovered fixture if it qualifies; return its table status.
    fn register_fixture(&mut self, fixture: &FixtureInfo) -> String {
        if fixture.capability == Capability::None {
            return "UNSUPPORTED".to_string();
        }
        if self.exclusions.lights.contains(fixture.id) {
            return "EXCLUDED".to_string();
        }

        self.tracker.insert(fixture.id, fixture.capability);

        let mut status = if self.exclusions.manual_override.contains(fixture.id) {
            // Never flagged manual regardless of drift
            "FORCE".to_string()
        } else {
            "AUTO".to_string()
        };
        if fixture.capability.has_brightness() && !self.exclusions.brightness.contains(fixture.id) {
            status.push_str("|BRIGHTNESS");
        }
        if fixture.capability.has_colortemp() && !self.exclusions.colortemp.contains(fixture.id) {
            status.push_str("|COLORTEMP");
        }
        status
    }

    /// One polling cycle over all tracked fixtures.
    ///
    /// Never fails: every error path logs and degrades to skipping the cycle
    /// or the fixture. The fixed poll interval is the retry cadence.
    pub fn run_cycle(&mut self, now: DateTime<Local>, targets: DeviceTargets) {
        if let Err(e) = self.bridge.connect() {
            log_pipe!();
            log_error!("Could not connect to the bridge: {e:#}");
            return;
        }

        let fixtures = match self.bridge.list_fixtures() {
            Ok(fixtures) => fixtures,
            Err(e) => {
                log_pipe!();
                log_error!("Error retrieving fixture information: {e:#}");
                return;
            }
        };

        for fixture in fixtures {
            if !self.tracker.contains(fixture.id) {
                continue;
            }

            let state = match self.bridge.fixture_state(fixture.id) {
                Ok(state) => state,
                Err(e) => {
                    log_error!(
                        "[{:>2}] {}: error retrieving state: {e:#}",
                        fixture.id,
                        fixture.name
                    );
                    continue;
                }
            };

            self.reconcile_fixture(now, &fixture, state, targets);
        }
    }

    /// Evaluate one fixture against the targets and the tracked record.
    fn reconcile_fixture(
        &mut self,
        now: DateTime<Local>,
        fixture: &FixtureInfo,
        live: FixtureState,
        targets: DeviceTargets,
    ) {
        let Some(record) = self.tracker.get_mut(fixture.id) else {
            return;
        };

        if !live.on || !live.reachable {
            if record.manual_override {
                log_decorated!(
                    "[{:>2}] {}: turned off, will resume control when turned on",
                    fixture.id,
                    fixture.name
                );
                record.reset();
            }
            return;
        }

        if record.manual_override {
            return;
        }

        // Cooldown: a fresh record (sentinel timestamp) always proceeds
        if let Some(last) = record.last_reconciled
            && now.signed_duration_since(last) <= self.update_interval
        {
            return;
        }

        // Attributes the fixture cannot express fall back to the tracked
        // value, which neutralizes them for override detection
        let observed_brightness = if record.capability.has_brightness() {
            live.brightness
        } else {
            record.last_brightness
        };
        let observed_colortemp = if record.capability.has_colortemp() {
            live.colortemp
        } else {
            record.last_colortemp
        };

        match classify_deviation(
            record,
            observed_brightness,
            observed_colortemp,
            fixture.id,
            &self.exclusions,
        ) {
            Deviation::Manual => {
                log_decorated!(
                    "[{:>2}] {}: state changed since last update, presuming manual override [bri {}=>{} | ct {}=>{}]",
                    fixture.id,
                    fixture.name,
                    display(record.last_brightness),
                    display(observed_brightness),
                    display(record.last_colortemp),
                    display(observed_colortemp)
                );
                record.manual_override = true;
            }
            Deviation::Benign => {
                let mut update = StateUpdate::default();
                if record.capability.has_brightness()
                    && !self.exclusions.brightness.contains(fixture.id)
                    && observed_brightness != Some(targets.brightness)
                {
                    update.brightness = Some(targets.brightness);
                }
                if record.capability.has_colortemp()
                    && !self.exclusions.colortemp.contains(fixture.id)
                    && observed_colortemp != Some(targets.colortemp)
                {
                    update.colortemp = Some(targets.colortemp);
                }

                // Passive sync; written attributes advance to target below,
                // and only once the bridge confirms the write
                record.last_brightness = observed_brightness;
                record.last_colortemp = observed_colortemp;

                if !update.is_empty() {
                    if let Some(brightness) = update.brightness {
                        log_decorated!(
                            "[{:>2}] {}: changing brightness to {} ({}%), from {}",
                            fixture.id,
                            fixture.name,
                            brightness,
                            crate::targets::device_to_percent(brightness),
                            display(observed_brightness)
                        );
                    }
                    if let Some(colortemp) = update.colortemp {
                        log_decorated!(
                            "[{:>2}] {}: changing color temperature to {} mired ({}K), from {}",
                            fixture.id,
                            fixture.name,
                            colortemp,
                            crate::targets::mired_to_kelvin(colortemp),
                            display(observed_colortemp)
                        );
                    }

                    match self.bridge.apply_update(fixture.id, &update) {
                        Ok(true) => {
                            if update.brightness.is_some() {
                                record.last_brightness = Some(targets.brightness);
                            }
                            if update.colortemp.is_some() {
                                record.last_colortemp = Some(targets.colortemp);
                            }
                        }
                        Ok(false) => {
                            log_error!(
                                "[{:>2}] {}: bridge rejected the update",
                                fixture.id,
                                fixture.name
                            );
                        }
                        Err(e) => {
                            log_error!(
                                "[{:>2}] {}: error setting fixture state: {e:#}",
                                fixture.id,
                                fixture.name
                            );
                        }
                    }
                }
            }
        }

        record.last_reconciled = Some(now);
    }

    /// Force the next cycle to update every non-overridden fixture
    /// immediately; used when sleep mode toggles.
    pub fn expire_cooldowns(&mut self) {
        self.tracker.expire_cooldowns();
    }

    pub fn tracked_count(&self) -> usize {
        self.tracker.len()
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl ReconciliationEngine {
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }
}

/// Classify an observed deviation.
///
/// Benign when every non-excluded attribute is within its change threshold,
/// when the fixture is excluded from override detection, or on the first
/// reconciliation after (re)discovery.
fn classify_deviation(
    record: &FixtureRecord,
    observed_brightness: Option<u16>,
    observed_colortemp: Option<u16>,
    id: u32,
    exclusions: &Exclusions,
) -> Deviation {
    if record.last_reconciled.is_none() {
        return Deviation::Benign;
    }
    if exclusions.manual_override.contains(id) {
        return Deviation::Benign;
    }

    let brightness_ok = exclusions.brightness.contains(id)
        || !exceeds_threshold(
            observed_brightness,
            record.last_brightness,
            BRIGHTNESS_CHANGE_THRESHOLD,
        );
    let colortemp_ok = exclusions.colortemp.contains(id)
        || !exceeds_threshold(
            observed_colortemp,
            record.last_colortemp,
            COLORTEMP_CHANGE_THRESHOLD,
        );

    if brightness_ok && colortemp_ok {
        Deviation::Benign
    } else {
        Deviation::Manual
    }
}

/// Whether an observed value drifted past the change threshold.
///
/// Unobservable or never-tracked attributes cannot signal an override.
fn exceeds_threshold(observed: Option<u16>, tracked: Option<u16>, threshold: u16) -> bool {
    match (observed, tracked) {
        (Some(observed), Some(tracked)) => {
            (observed as i32 - tracked as i32).abs() > threshold as i32
        }
        _ => false,
    }
}

fn display(value: Option<u16>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reconciled_record() -> FixtureRecord {
        let mut record = FixtureRecord::new(Capability::Both);
        record.last_brightness = Some(200);
        record.last_colortemp = Some(250);
        record.last_reconciled = Some(Local.with_ymd_and_hms(2025, 6, 21, 12, 0, 0).unwrap());
        record
    }

    #[test]
    fn small_drift_is_benign() {
        let record = reconciled_record();
        let exclusions = Exclusions::default();
        assert_eq!(
            classify_deviation(&record, Some(190), Some(260), 1, &exclusions),
            Deviation::Benign
        );
    }

    #[test]
    fn large_brightness_drift_is_manual() {
        let record = reconciled_record();
        let exclusions = Exclusions::default();
        assert_eq!(
            classify_deviation(&record, Some(50), Some(250), 1, &exclusions),
            Deviation::Manual
        );
    }

    #[test]
    fn drift_exactly_at_threshold_is_benign() {
        let record = reconciled_record();
        let exclusions = Exclusions::default();
        let at_threshold = 200 + BRIGHTNESS_CHANGE_THRESHOLD;
        assert_eq!(
            classify_deviation(&record, Some(at_threshold), Some(250), 1, &exclusions),
            Deviation::Benign
        );
        assert_eq!(
            classify_deviation(&record, Some(at_threshold + 1), Some(250), 1, &exclusions),
            Deviation::Manual
        );
    }

    #[test]
    fn first_pass_accepts_any_state() {
        let record = FixtureRecord::new(Capability::Both);
        let exclusions = Exclusions::default();
        assert_eq!(
            classify_deviation(&record, Some(1), Some(500), 1, &exclusions),
            Deviation::Benign
        );
    }

    #[test]
    fn excluded_axis_cannot_trigger_override() {
        let record = reconciled_record();
        let exclusions = Exclusions {
            brightness: crate::config::ExclusionList::parse("1"),
            ..Default::default()
        };
        // Brightness swung wildly but the axis is excluded for fixture 1
        assert_eq!(
            classify_deviation(&record, Some(10), Some(250), 1, &exclusions),
            Deviation::Benign
        );
        // A different fixture with the same drift is still manual
        assert_eq!(
            classify_deviation(&record, Some(10), Some(250), 2, &exclusions),
            Deviation::Manual
        );
    }

    #[test]
    fn override_exclusion_forces_benign() {
        let record = reconciled_record();
        let exclusions = Exclusions {
            manual_override: crate::config::ExclusionList::parse("-1"),
            ..Default::default()
        };
        assert_eq!(
            classify_deviation(&record, Some(10), Some(500), 7, &exclusions),
            Deviation::Benign
        );
    }

    #[test]
    fn unobservable_attributes_never_signal_override() {
        let mut record = FixtureRecord::new(Capability::BrightnessOnly);
        record.last_brightness = Some(100);
        record.last_reconciled = Some(Local.with_ymd_and_hms(2025, 6, 21, 12, 0, 0).unwrap());
        let exclusions = Exclusions::default();
        // Color temperature is None on both sides for a brightness-only fixture
        assert_eq!(
            classify_deviation(&record, Some(110), None, 1, &exclusions),
            Deviation::Benign
        );
    }
}
