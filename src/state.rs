//! Persisted controller modes, following XDG Base Directory standards.
//!
//! The two mode flags survive restarts as a small JSON record in
//! `XDG_STATE_HOME/circadianr/`, keyed by a slug of the configured accessory
//! name so multiple accessories never share a record. Loading is forgiving:
//! a missing or unreadable record simply yields the defaults (both flags
//! off), matching the first-run experience.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// The persisted mode record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedModes {
    pub enabled: bool,
    pub sleep: bool,
}

/// Resolve the state directory, preferring `XDG_STATE_HOME`.
fn state_dir() -> PathBuf {
    let state_home = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local/state")
        });
    state_home.join("circadianr")
}

/// Stable filename slug for an accessory name.
fn slug(name: &str) -> String {
    let slug: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    if slug.is_empty() { "default".to_string() } else { slug }
}

/// Path of the mode record for an accessory name.
pub fn modes_path(name: &str) -> PathBuf {
    state_dir().join(format!("{}.json", slug(name)))
}

/// Load persisted modes; any failure falls back to defaults.
pub fn load_modes(name: &str) -> PersistedModes {
    match fs::read_to_string(modes_path(name)) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
        Err(_) => PersistedModes::default(),
    }
}

/// Persist the mode record, creating the state directory as needed.
///
/// Writes through a temp file and renames so a crash mid-write never leaves
/// a truncated record.
pub fn save_modes(name: &str, modes: &PersistedModes) -> Result<()> {
    let path = modes_path(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create state directory {}", parent.display()))?;
    }

    let payload = serde_json::to_vec_pretty(modes).context("failed to serialize mode state")?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, payload)
        .with_context(|| format!("failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, &path)
        .with_context(|| format!("failed to move mode state into place at {}", path.display()))?;
    Ok(())
}
