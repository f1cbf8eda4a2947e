//! Binary entry point: parse arguments and dispatch.

use solpaper::args::{CliAction, ParsedArgs, display_help, display_version_info};
use solpaper::commands;
use solpaper::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use solpaper::{Solpaper, config, log_error_exit, log_error_standalone};

fn main() {
    let parsed = ParsedArgs::from_env();
    let debug_enabled = parsed.debug_enabled;

    if let Err(e) = config::set_config_dir(parsed.config_dir.clone()) {
        log_error_standalone!("{e}");
        std::process::exit(EXIT_FAILURE);
    }

    let result = match parsed.action {
        CliAction::Run => Solpaper::new(debug_enabled).run(),
        CliAction::Status { json } => commands::status::handle_status_command(json, debug_enabled),
        CliAction::Schedule { date } => {
            commands::schedule::handle_schedule_command(date, debug_enabled)
        }
        CliAction::Apply => commands::apply::handle_apply_command(debug_enabled),
        CliAction::Validate { pack } => {
            commands::validate::handle_validate_command(pack.as_deref(), debug_enabled)
        }
        CliAction::Packs => commands::packs::handle_packs_command(debug_enabled),
        CliAction::Reload => commands::reload::handle_reload_command(debug_enabled),
        CliAction::Stop => commands::stop::handle_stop_command(debug_enabled),
        CliAction::Simulate {
            start_time,
            end_time,
            multiplier,
            log_to_file,
        } => commands::simulate::handle_simulate_command(
            &start_time,
            &end_time,
            multiplier,
            log_to_file,
            debug_enabled,
        ),
        CliAction::Help { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::ShowHelp => {
            display_help();
            Ok(())
        }
        CliAction::ShowVersion => {
            display_version_info();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            display_help();
            std::process::exit(EXIT_FAILURE);
        }
    };

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            log_error_exit!("{e:#}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}
