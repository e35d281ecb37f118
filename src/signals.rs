//! Signal handling for circadianr.
//!
//! Unix signals are the external toggle surface of the daemon: SIGUSR1
//! toggles sleep mode, SIGUSR2 toggles automatic control, and
//! SIGINT/SIGTERM/SIGHUP shut the daemon down. A dedicated thread consumes
//! the signal iterator and forwards typed messages over an mpsc channel; the
//! supervisor drains that channel inside its interruptible sleep, so toggles
//! take effect without waiting out a poll interval.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc,
    thread,
};

/// Typed signal message for the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Toggle sleep mode (SIGUSR1)
    ToggleSleep,
    /// Toggle automatic control (SIGUSR2)
    ToggleEnabled,
    /// Shut down (SIGINT, SIGTERM, SIGHUP)
    Shutdown,
}

/// Signal handling state shared between threads.
pub struct SignalState {
    /// Cleared as soon as a shutdown signal arrives; the supervisor checks it
    /// at the top of every loop iteration.
    pub running: Arc<AtomicBool>,
    /// Receiver for typed signal messages
    pub receiver: mpsc::Receiver<SignalMessage>,
    /// Sender kept around so in-process callers can inject messages
    pub sender: mpsc::Sender<SignalMessage>,
}

/// Set up signal handling for the application.
///
/// Spawns a background thread that watches for signals and forwards the
/// matching [`SignalMessage`] over the channel.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (sender, receiver) = mpsc::channel();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_handle = running.clone();
    let sender_handle = sender.clone();

    thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGUSR1 => {
                    let _ = sender_handle.send(SignalMessage::ToggleSleep);
                }
                SIGUSR2 => {
                    let _ = sender_handle.send(SignalMessage::ToggleEnabled);
                }
                SIGINT | SIGTERM | SIGHUP => {
                    // Flip the flag here too so shutdown is observed even if
                    // the channel is momentarily unserviced
                    running_handle.store(false, Ordering::SeqCst);
                    let _ = sender_handle.send(SignalMessage::Shutdown);
                }
                _ => {}
            }
        }
    });

    Ok(SignalState {
        running,
        receiver,
        sender,
    })
}
