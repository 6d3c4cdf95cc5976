//! Entry point for the `sol` binary.
//!
//! Parses the command line, loads the optional configuration file, wires
//! termination signals to a cancellation token and hands off to the command
//! handlers in `sol::commands`. Every handler returns the exit code:
//! 0 on success, 1 on failure, 130 when the user cancelled.

use anyhow::{Context, Result};
use std::path::Path;

use sol::args::{self, CliAction, Command, GlobalOptions, ParsedArgs};
use sol::cancel::CancellationToken;
use sol::commands::{self, Session};
use sol::config;
use sol::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use sol::logger::Log;
use sol::signals::setup_signal_handler;
use sol::{log_debug, log_error_exit, log_pipe, log_warning};

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            log_error_exit!("{:#}", e);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    match ParsedArgs::from_env().action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(EXIT_SUCCESS)
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(EXIT_SUCCESS)
        }
        CliAction::ShowHelpDueToError => {
            log_warning!("Unknown or malformed arguments");
            args::display_help();
            Ok(EXIT_FAILURE)
        }
        CliAction::Run { command, options } => dispatch(command, options),
    }
}

fn dispatch(command: Command, options: GlobalOptions) -> Result<i32> {
    // Keep the guard alive until the command returns so the log is flushed
    let _log_guard = match &options.log_file {
        Some(path) => Some(
            Log::start_file_logging(path.clone())
                .with_context(|| format!("failed to start logging to {path}"))?,
        ),
        None => None,
    };

    let (config, source) = config::load(options.config_dir.as_deref().map(Path::new))?;
    if options.debug_enabled {
        config.log_config(source.as_deref());
        log_pipe!();
        log_debug!("Debug mode enabled - showing bulb commands and pacing");
    }

    let token = CancellationToken::new();
    let signals = setup_signal_handler(token.clone(), options.debug_enabled)?;
    let session = Session::new(options, config, token);

    let code = match &command {
        Command::Now => commands::run::run_now(&session),
        Command::At(time) => commands::run::run_at(&session, time.as_deref()),
        Command::Up(time) => commands::run::run_up(&session, time.as_deref()),
        Command::Demo => commands::demo::run_demo_command(&session),
        Command::Off => commands::off::run_off_command(&session),
        Command::Status => commands::status::run_status_command(&session),
        Command::Profiles => commands::profiles::run_profiles_command(&session),
        Command::Ablation(time) => {
            commands::ablation::run_ablation_command(&session, time.as_deref())
        }
        Command::Setup => commands::setup::run_setup_command(&session),
    };

    signals.close();
    code
}
