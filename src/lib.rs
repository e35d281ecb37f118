//! # Circadianr Library
//!
//! Internal library for the circadianr binary application.
//!
//! This library exists to enable testing of the reconciliation internals and
//! to provide clean separation between CLI dispatch (main.rs) and the daemon
//! logic.
//!
//! ## Architecture
//!
//! - **Solar model**: `solar` converts wall-clock time and coordinates into a
//!   normalized sun-position scalar
//! - **Targets**: `targets` maps sun position and sleep mode to brightness and
//!   color-temperature targets, in percent/Kelvin and in device units
//! - **Bridge**: `bridge` is the seam to the lighting bridge, with a concrete
//!   Hue HTTP client
//! - **Engine**: `engine` polls live fixture state, classifies deviations, and
//!   pushes corrections; `tracking` owns the per-fixture records
//! - **Supervisor**: `supervisor` owns the enable/sleep mode flags and the
//!   polling loop lifecycle
//! - **Infrastructure**: configuration, signal handling, mode persistence,
//!   single-instance locking, and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod engine;
pub mod signals;
pub mod solar;
pub mod state;
pub mod supervisor;
pub mod targets;
pub mod time_source;
pub mod tracking;

mod lock;

// Re-export for binary
pub use lock::acquire_lock;
pub use supervisor::Controller;
