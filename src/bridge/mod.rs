//! Bridge abstraction for the lighting network.
//!
//! The reconciliation engine talks to fixtures exclusively through the
//! [`LightBridge`] trait, which mirrors the four operations the external
//! bridge exposes: connect, enumerate fixtures, read one fixture's live
//! state, and write a state update. The concrete [`hue::HueBridge`]
//! implementation speaks the Hue REST API; tests drive the engine through a
//! generated mock instead.
//!
//! Bridge calls are fallible in two distinct ways the engine cares about:
//! `connect`/`list_fixtures` failures skip the whole cycle, per-fixture
//! read/write failures skip only that fixture.

use anyhow::Result;

use crate::tracking::Capability;

pub mod hue;

pub use hue::HueBridge;

/// A fixture as reported by the bridge's enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureInfo {
    pub id: u32,
    pub name: String,
    /// Derived from the attribute set the fixture advertises.
    pub capability: Capability,
}

/// Live state of one fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureState {
    pub on: bool,
    pub reachable: bool,
    /// Native device units; `None` when the fixture has no brightness channel.
    pub brightness: Option<u16>,
    /// Mireds; `None` when the fixture has no color-temperature channel.
    pub colortemp: Option<u16>,
}

/// A partial state write; only the populated attributes are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub brightness: Option<u16>,
    pub colortemp: Option<u16>,
}

impl StateUpdate {
    pub fn is_empty(&self) -> bool {
        self.brightness.is_none() && self.colortemp.is_none()
    }
}

/// Trait for lighting bridges the engine can reconcile against.
///
/// Methods take `&mut self` because concrete bridges may hold connection
/// state; the engine re-validates the connection at the top of every cycle.
#[cfg_attr(feature = "testing-support", mockall::automock)]
pub trait LightBridge {
    /// Establish (or re-validate) the connection and credentials.
    fn connect(&mut self) -> Result<()>;

    /// Enumerate all fixtures known to the bridge.
    fn list_fixtures(&mut self) -> Result<Vec<FixtureInfo>>;

    /// Fetch the live state of a single fixture.
    fn fixture_state(&mut self, id: u32) -> Result<FixtureState>;

    /// Apply a partial state update to a single fixture.
    ///
    /// Returns `Ok(false)` when the bridge accepted the request but reported
    /// the update as unsuccessful.
    fn apply_update(&mut self, id: u32, update: &StateUpdate) -> Result<bool>;
}
