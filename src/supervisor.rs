//! Controller supervisor.
//!
//! The [`Controller`] owns the enable/sleep mode flags and the lifecycle of
//! the reconciliation loop. One sequential loop runs per process: enabling
//! triggers a capability discovery pass and then one reconcile cycle per
//! poll interval; disabling lets the in-flight cycle finish and exits the
//! loop. Mode toggles arrive asynchronously over the signal channel and are
//! applied inside the interruptible inter-cycle sleep, so the loop observes
//! the latest flags at the top of every iteration and a disable never waits
//! out the poll interval.
//!
//! Mode changes are persisted through a dirty flag flushed once per loop
//! iteration, coalescing bursts of toggles into a single write.

use anyhow::Result;
use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::constants::*;
use crate::engine::ReconciliationEngine;
use crate::signals::{SignalMessage, SignalState};
use crate::solar;
use crate::state::{self, PersistedModes};
use crate::targets;
use crate::time_source;

/// Owner of the mode flags and the polling loop.
pub struct Controller {
    config: Config,
    engine: ReconciliationEngine,
    signals: SignalState,
    debug_enabled: bool,
    modes: PersistedModes,
    modes_dirty: bool,
    loop_active: bool,
}

impl Controller {
    /// Create a controller, restoring the persisted mode flags.
    pub fn new(
        config: Config,
        engine: ReconciliationEngine,
        signals: SignalState,
        debug_enabled: bool,
    ) -> Self {
        let name = config.name.as_deref().unwrap_or(DEFAULT_NAME);
        let modes = state::load_modes(name);

        log_block_start!(
            "Restored modes: control {}, sleep {}",
            if modes.enabled { "enabled" } else { "disabled" },
            if modes.sleep { "on" } else { "off" }
        );
        log_indented!("SIGUSR2 toggles control, SIGUSR1 toggles sleep");

        Self {
            config,
            engine,
            signals,
            debug_enabled,
            modes,
            modes_dirty: false,
            loop_active: false,
        }
    }

    pub fn get_enabled(&self) -> bool {
        self.modes.enabled
    }

    pub fn get_sleep(&self) -> bool {
        self.modes.sleep
    }

    /// Enable or disable automatic control.
    ///
    /// The run loop reacts on its next iteration: enabling starts discovery
    /// and the polling loop (a no-op when the loop is already active),
    /// disabling lets the current cycle finish before the loop exits.
    pub fn set_enabled(&mut self, on: bool) {
        if self.modes.enabled == on {
            return;
        }
        self.modes.enabled = on;
        self.modes_dirty = true;
        log_block_start!(
            "Automatic control {}",
            if on { "enabled" } else { "disabled" }
        );
    }

    /// Enable or disable sleep mode.
    ///
    /// Expires every non-overridden fixture's cooldown so the next cycle
    /// applies the sleep targets immediately.
    pub fn set_sleep(&mut self, on: bool) {
        if self.modes.sleep == on {
            return;
        }
        self.modes.sleep = on;
        self.modes_dirty = true;
        log_block_start!("Sleep mode {}", if on { "on" } else { "off" });
        self.engine.expire_cooldowns();
    }

    /// Run until a shutdown signal arrives.
    pub fn run(mut self) -> Result<()> {
        let poll_interval = self.config.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval <= 0.0 {
            log_pipe!();
            log_warning!("poll_interval is 0, bridge monitoring is disabled");
        }

        while self.signals.running.load(Ordering::SeqCst) {
            self.flush_modes();
            if self.modes.enabled && poll_interval > 0.0 {
                self.monitor_bridge(poll_interval);
            } else {
                self.wait_for_signals(Duration::from_secs(IDLE_WAIT_SECS));
            }
        }

        self.flush_modes();
        Ok(())
    }

    /// The polling loop: discovery, then one reconcile cycle per interval.
    ///
    /// Returns once control is disabled or shutdown is requested. Discovery
    /// failures are retried while still enabled; the loop never gives up on
    /// a flaky bridge.
    fn monitor_bridge(&mut self, poll_interval: f64) {
        if self.loop_active {
            return;
        }
        self.loop_active = true;
        log_block_start!("Started monitoring the bridge");

        let mut discovered = false;
        while self.modes.enabled && self.signals.running.load(Ordering::SeqCst) {
            if !discovered {
                match self.engine.discover() {
                    Ok(()) => discovered = true,
                    Err(e) => {
                        log_pipe!();
                        log_error!("Fixture discovery failed: {e:#}");
                        log_indented!("Retrying in {IDLE_WAIT_SECS}s");
                        self.wait_for_signals(Duration::from_secs(IDLE_WAIT_SECS));
                        continue;
                    }
                }
            }

            self.run_cycle();
            self.flush_modes();
            self.wait_for_signals(Duration::from_secs_f64(poll_interval));
        }

        self.loop_active = false;
        log_block_start!("Stopped monitoring the bridge");
    }

    /// Compute this instant's targets once and reconcile every fixture.
    fn run_cycle(&mut self) {
        let now = time_source::now();
        let latitude = self.config.latitude.unwrap_or(DEFAULT_LATITUDE);
        let longitude = self.config.longitude.unwrap_or(DEFAULT_LONGITUDE);

        let sun_position = match solar::sun_position(now, latitude, longitude) {
            Ok(position) => position,
            Err(e) => {
                log_pipe!();
                log_error!("Solar position unavailable: {e:#}");
                return;
            }
        };

        let resolved = targets::resolve_targets(sun_position, self.modes.sleep, &self.config);
        let device = resolved.to_device_units();

        if self.debug_enabled {
            log_debug!(
                "sun position {:.2} -> {}% @ {}K (bri {}, ct {} mired)",
                sun_position,
                resolved.brightness_percent,
                resolved.colortemp_kelvin,
                device.brightness,
                device.colortemp
            );
        }

        self.engine.run_cycle(now, device);
    }

    /// Interruptible sleep: wait out `timeout` on the signal channel,
    /// applying any mode toggles that arrive in the meantime.
    fn wait_for_signals(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            match self.signals.receiver.recv_timeout(remaining) {
                Ok(message) => {
                    if self.handle_signal(message) {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => return,
                Err(RecvTimeoutError::Disconnected) => {
                    self.signals.running.store(false, Ordering::SeqCst);
                    return;
                }
            }
        }
    }

    /// Apply one signal message; returns true when the wait should end early
    /// so the loops re-check their conditions.
    fn handle_signal(&mut self, message: SignalMessage) -> bool {
        match message {
            SignalMessage::ToggleSleep => {
                let sleep = !self.modes.sleep;
                self.set_sleep(sleep);
                false
            }
            SignalMessage::ToggleEnabled => {
                let enabled = !self.modes.enabled;
                self.set_enabled(enabled);
                true
            }
            SignalMessage::Shutdown => {
                self.signals.running.store(false, Ordering::SeqCst);
                true
            }
        }
    }

    /// Debounced persistence: at most one write per loop iteration.
    fn flush_modes(&mut self) {
        if !self.modes_dirty {
            return;
        }
        self.modes_dirty = false;

        let name = self.config.name.as_deref().unwrap_or(DEFAULT_NAME);
        if let Err(e) = state::save_modes(name, &self.modes) {
            log_pipe!();
            log_warning!("Could not persist mode state: {e:#}");
        }
    }
}
