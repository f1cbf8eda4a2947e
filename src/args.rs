//! Command-line argument parsing.
//!
//! Global flags (`--debug`, `--config <dir>`, `--help`, `--version`) may appear
//! anywhere. The first positional argument names the command; the rest are its
//! arguments.

use chrono::NaiveDate;

/// What the binary should do.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    /// Run the wallpaper service.
    Run,
    /// Resolve once and print the active segment.
    Status { json: bool },
    /// Print solar events and the segment timeline for a date (today when `None`).
    Schedule { date: Option<NaiveDate> },
    /// Resolve once, apply the image and exit.
    Apply,
    /// Check a pack (the configured one when `None`).
    Validate { pack: Option<String> },
    /// List installed packs.
    Packs,
    /// Ask the running service to reload.
    Reload,
    /// Ask the running service to exit.
    Stop,
    /// Run the service on simulated time with the dry-run backend.
    Simulate {
        start_time: String,
        end_time: String,
        /// 0 means fast-forward.
        multiplier: f64,
        log_to_file: bool,
    },
    /// `help [COMMAND]`
    Help { command: Option<String> },
    ShowHelp,
    ShowVersion,
    /// Bad arguments; a warning was already printed.
    ShowHelpDueToError,
}

/// Result of parsing the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgs {
    pub action: CliAction,
    pub debug_enabled: bool,
    pub config_dir: Option<String>,
}

/// Every command name, for `help` and error messages.
pub const COMMANDS: &[&str] = &[
    "status", "schedule", "apply", "validate", "packs", "reload", "stop", "simulate", "help",
];

fn usage_error(message: &str) -> CliAction {
    log_warning_standalone!("{message}");
    CliAction::ShowHelpDueToError
}

/// `args` (everything after the command) must hold `min..=max` entries.
fn arity(command: &str, args: &[String], min: usize, max: usize) -> Result<(), CliAction> {
    if args.len() < min {
        return Err(usage_error(&format!(
            "Missing arguments for '{command}'. See 'solpaper help {command}'"
        )));
    }
    if args.len() > max {
        return Err(usage_error(&format!(
            "Unexpected argument '{}' for '{command}'",
            args[max]
        )));
    }
    Ok(())
}

impl ParsedArgs {
    /// Parse arguments as given by `std::env::args()` (program name first).
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut config_dir = None;
        let mut help = false;
        let mut version = false;
        let mut json = false;
        let mut log_to_file = false;
        let mut bad_flag: Option<String> = None;
        let mut positional: Vec<String> = Vec::new();

        let args: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => help = true,
                "--version" | "-V" | "-v" => version = true,
                "--json" => json = true,
                "--log" => log_to_file = true,
                "--config" | "-c" => match args.get(i + 1) {
                    Some(dir) if !dir.starts_with('-') => {
                        config_dir = Some(dir.clone());
                        i += 1;
                    }
                    _ => {
                        bad_flag.get_or_insert_with(|| {
                            "Missing directory for --config. Usage: --config <directory>".into()
                        });
                    }
                },
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    bad_flag.get_or_insert_with(|| format!("Unknown option: {flag}"));
                }
                _ => positional.push(arg.clone()),
            }
            i += 1;
        }

        let action = Self::action(
            &positional,
            help,
            version,
            json,
            log_to_file,
            bad_flag.as_deref(),
        );

        ParsedArgs {
            action,
            debug_enabled,
            config_dir,
        }
    }

    fn action(
        positional: &[String],
        help: bool,
        version: bool,
        json: bool,
        log_to_file: bool,
        bad_flag: Option<&str>,
    ) -> CliAction {
        if version {
            return CliAction::ShowVersion;
        }

        let command = positional.first().map(String::as_str);
        if help {
            return match command {
                Some(cmd) => CliAction::Help {
                    command: Some(cmd.to_string()),
                },
                None => CliAction::ShowHelp,
            };
        }
        if let Some(message) = bad_flag {
            return usage_error(message);
        }
        if json && command != Some("status") {
            return usage_error("--json is only supported by 'status'");
        }
        if log_to_file && command != Some("simulate") {
            return usage_error("--log is only supported by 'simulate'");
        }

        let Some(command) = command else {
            return CliAction::Run;
        };
        let rest = &positional[1..];

        let parsed = match command {
            "status" => arity(command, rest, 0, 0).map(|_| CliAction::Status { json }),
            "apply" => arity(command, rest, 0, 0).map(|_| CliAction::Apply),
            "packs" => arity(command, rest, 0, 0).map(|_| CliAction::Packs),
            "reload" => arity(command, rest, 0, 0).map(|_| CliAction::Reload),
            "stop" => arity(command, rest, 0, 0).map(|_| CliAction::Stop),
            "validate" => arity(command, rest, 0, 1).map(|_| CliAction::Validate {
                pack: rest.first().cloned(),
            }),
            "help" => arity(command, rest, 0, 1).map(|_| CliAction::Help {
                command: rest.first().cloned(),
            }),
            "schedule" => arity(command, rest, 0, 1).and_then(|_| match rest.first() {
                None => Ok(CliAction::Schedule { date: None }),
                Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map(|date| CliAction::Schedule { date: Some(date) })
                    .map_err(|_| usage_error(&format!("Invalid date '{raw}', expected YYYY-MM-DD"))),
            }),
            "simulate" => arity(command, rest, 2, 3).and_then(|_| {
                let multiplier = match rest.get(2) {
                    None => 0.0,
                    Some(raw) => match raw.parse::<f64>() {
                        Ok(m) if m.is_finite() && m >= 0.0 => m,
                        _ => {
                            return Err(usage_error(&format!(
                                "Invalid multiplier '{raw}', expected a number >= 0"
                            )));
                        }
                    },
                };
                Ok(CliAction::Simulate {
                    start_time: rest[0].clone(),
                    end_time: rest[1].clone(),
                    multiplier,
                    log_to_file,
                })
            }),
            unknown => Err(usage_error(&format!("Unknown command: {unknown}"))),
        };

        parsed.unwrap_or_else(|error| error)
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

pub fn display_version_info() {
    log_version!();
    log_pipe!();
    log_end!();
}

pub fn display_help() {
    log_version!();
    log_block_start!("{}", env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("solpaper [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use a custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("(none)                 Run the wallpaper service");
    log_indented!("status [--json]        Show the active wallpaper and the next change");
    log_indented!("schedule [DATE]        Show solar events and segment times for a day");
    log_indented!("apply                  Set the wallpaper for the current time and exit");
    log_indented!("validate [PACK]        Check a pack for problems");
    log_indented!("packs                  List installed packs");
    log_indented!("reload                 Make the running service reload its configuration");
    log_indented!("stop                   Stop the running service");
    log_indented!("simulate <start> <end> [multiplier] [--log]");
    log_indented!("                       Replay a time range without changing the wallpaper");
    log_indented!("help [COMMAND]         Show help for a command");
    log_end!();
}
