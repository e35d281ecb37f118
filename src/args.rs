//! Command-line argument parsing.
//!
//! Handles the small flag surface of the daemon and provides a clean
//! interface for main.rs dispatch. Unknown options fall back to the help
//! text rather than being silently ignored.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit with failure
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

/// Parse command-line arguments (without the program name).
pub fn parse<I>(args: I) -> ParsedArgs
where
    I: IntoIterator<Item = String>,
{
    let mut debug_enabled = false;
    let mut config_dir = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--debug" | "-d" => debug_enabled = true,
            "--config" | "-c" => match args.next() {
                Some(dir) => config_dir = Some(dir),
                None => {
                    return ParsedArgs {
                        action: CliAction::ShowHelpDueToError,
                    };
                }
            },
            "--help" | "-h" => {
                return ParsedArgs {
                    action: CliAction::ShowHelp,
                };
            }
            "--version" | "-V" => {
                return ParsedArgs {
                    action: CliAction::ShowVersion,
                };
            }
            _ => {
                return ParsedArgs {
                    action: CliAction::ShowHelpDueToError,
                };
            }
        }
    }

    ParsedArgs {
        action: CliAction::Run {
            debug_enabled,
            config_dir,
        },
    }
}

/// Display the help text.
pub fn display_help() {
    log_version!();
    log_block_start!("Usage: circadianr [OPTIONS]");
    log_indented!("-d, --debug          Enable detailed debug output");
    log_indented!("-c, --config <DIR>   Use an alternate configuration directory");
    log_indented!("-h, --help           Print this help");
    log_indented!("-V, --version        Print version");
    log_block_start!("Runtime control (send to the running instance):");
    log_indented!("SIGUSR2              Toggle automatic control on/off");
    log_indented!("SIGUSR1              Toggle sleep mode on/off");
    log_indented!("SIGINT/SIGTERM       Shut down");
    log_end!();
}

/// Display version information.
pub fn display_version() {
    log_version!();
    log_indented!("Circadian lighting daemon for Philips Hue bridges");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_strs(args: &[&str]) -> CliAction {
        parse(args.iter().map(|s| s.to_string())).action
    }

    #[test]
    fn no_args_runs_with_defaults() {
        assert_eq!(
            parse_strs(&[]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
            }
        );
    }

    #[test]
    fn debug_and_config_flags() {
        assert_eq!(
            parse_strs(&["--debug", "--config", "/tmp/conf"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/conf".to_string()),
            }
        );
        assert_eq!(
            parse_strs(&["-c", "/tmp/conf", "-d"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/conf".to_string()),
            }
        );
    }

    #[test]
    fn help_and_version_flags() {
        assert_eq!(parse_strs(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse_strs(&["-V"]), CliAction::ShowVersion);
    }

    #[test]
    fn unknown_or_incomplete_args_show_help() {
        assert_eq!(parse_strs(&["--bogus"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse_strs(&["--config"]), CliAction::ShowHelpDueToError);
    }
}
