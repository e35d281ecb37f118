//! Configuration loading.
//!
//! Handles config path resolution (default XDG location or a `--config`
//! override), first-run template creation, and loading with validation.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Commented template written on first run.
const DEFAULT_CONFIG_TEMPLATE: &str = r#"#[Accessory]
#name = "circadianr"            # Accessory name, namespaces persisted state

#[Location]
#latitude = 51.509865           # Geographic latitude
#longitude = -0.118092          # Geographic longitude

#[Curve]
#min_brightness = 50            # Brightness percent at solar midnight (1-100)
#max_brightness = 100           # Brightness percent during daylight (1-100)
#min_colortemp = 2200           # Color temperature at the horizon, Kelvin
#max_colortemp = 6500           # Color temperature at solar noon, Kelvin

#[Sleep]
#sleep_brightness = 25          # Brightness percent while sleep mode is on
#sleep_colortemp = 2000         # Color temperature while sleep mode is on

#[Reconciliation]
#update_interval = 90           # Seconds between writes to one fixture
#poll_interval = 0.5            # Seconds between bridge polling cycles

#[Exclusions]                   # Comma-separated fixture ids, "-1" = all
#exclude_lights = ""
#exclude_brightness = ""
#exclude_colortemp = ""
#exclude_manual_override = ""

#[Bridge]                       # Required
bridge_address = ""
bridge_username = ""
"#;

/// Set the configuration directory for the current process.
///
/// Can only be called once, at startup, before the first config read.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|dir| dir.clone())
}

/// Resolve the path of `circadianr.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom) = get_custom_config_dir() {
        return Ok(custom.join("circadianr.toml"));
    }

    let config_home = dirs::config_dir().context("could not determine config directory")?;
    Ok(config_home.join("circadianr").join("circadianr.toml"))
}

/// Load configuration using automatic path detection.
///
/// Creates a commented template and errors with instructions when no
/// configuration exists yet, since the bridge credentials have no default.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        create_default_config(&config_path)?;
        log_pipe!();
        log_warning!("No configuration found");
        log_indented!("Created a template at {}", config_path.display());
        log_indented!("Fill in bridge_address and bridge_username, then run again");
        anyhow::bail!("configuration incomplete: {}", config_path.display());
    }

    load_from_path(&config_path)
}

/// Load and validate configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;

    validate_config(&config)?;
    Ok(config)
}

/// Write the commented default template.
fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write default config to {}", path.display()))
}
