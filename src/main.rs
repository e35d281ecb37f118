//! circadianr binary entry point.
//!
//! Parses the CLI surface and assembles the daemon: configuration, the
//! single-instance lock, signal handling, the Hue bridge client, the
//! reconciliation engine, and the controller that runs it all.

use anyhow::{Context, Result};

use circadianr::args::{self, CliAction};
use circadianr::{log_block_start, log_end, log_error_exit, log_pipe, log_version};
use circadianr::bridge::HueBridge;
use circadianr::config;
use circadianr::constants::EXIT_FAILURE;
use circadianr::engine::ReconciliationEngine;
use circadianr::signals::setup_signal_handler;
use circadianr::{Controller, acquire_lock};

fn main() {
    let parsed = args::parse(std::env::args().skip(1));

    match parsed.action {
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => {
            if let Err(e) = run(debug_enabled, config_dir) {
                log_pipe!();
                log_error_exit!("{e:#}");
                std::process::exit(EXIT_FAILURE);
            }
        }
        CliAction::ShowHelp => args::display_help(),
        CliAction::ShowVersion => args::display_version(),
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn run(debug_enabled: bool, config_dir: Option<String>) -> Result<()> {
    log_version!();

    if config_dir.is_some() {
        config::set_config_dir(config_dir)?;
    }

    let config = config::load()?;
    config.log_config();

    // Hold the lock for the lifetime of the process
    let Some((_lock_file, _lock_path)) = acquire_lock()? else {
        log_end!();
        return Ok(());
    };

    let signals = setup_signal_handler()?;

    let address = config
        .bridge_address
        .as_deref()
        .context("bridge_address missing after validation")?;
    let username = config
        .bridge_username
        .as_deref()
        .context("bridge_username missing after validation")?;
    let bridge = HueBridge::new(address, username)?;

    let engine = ReconciliationEngine::new(Box::new(bridge), &config);
    let controller = Controller::new(config, engine, signals, debug_enabled);
    controller.run()?;

    log_block_start!("Shutting down circadianr...");
    log_end!();
    Ok(())
}
