//! Lock file management for single-instance enforcement.
//!
//! Two daemons reconciling the same fixtures would issue duplicate writes and
//! fight each other's override detection, so the process takes an exclusive
//! flock on a file in the runtime directory before starting. The kernel
//! releases the lock when the holder exits, so a held lock always means a
//! live instance; no stale-lock cleanup is needed.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// Acquire the single-instance lock.
///
/// # Returns
/// - `Ok(Some((lock_file, lock_path)))` when the lock was acquired; keep the
///   file handle alive for the lifetime of the process
/// - `Ok(None)` when another instance holds the lock (already logged)
pub fn acquire_lock() -> Result<Option<(File, String)>> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    let lock_path = format!("{runtime_dir}/circadianr.lock");

    // Open without truncating so a conflict can still read the holder's PID
    let mut lock_file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("failed to open lock file {lock_path}"))?;

    match lock_file.try_lock_exclusive() {
        Ok(()) => {
            lock_file.set_len(0)?;
            lock_file.seek(SeekFrom::Start(0))?;
            writeln!(&lock_file, "{}", std::process::id())?;
            lock_file.flush()?;
            Ok(Some((lock_file, lock_path)))
        }
        Err(_) => {
            let mut contents = String::new();
            let _ = lock_file.read_to_string(&mut contents);
            let holder = contents.lines().next().unwrap_or("unknown").trim();

            log_pipe!();
            log_error!("Another circadianr instance is already running (PID {holder})");
            log_indented!("A second instance would issue duplicate writes to the fixtures");
            Ok(None)
        }
    }
}
