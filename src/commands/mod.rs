//! Command handlers for the sol CLI.
//!
//! Every command receives a [`Session`]: the parsed options merged over the
//! configuration file, the profile catalog, the clock and the cancellation
//! token wired to the signal handler. Handlers return the process exit code.

pub mod ablation;
pub mod demo;
pub mod off;
pub mod profiles;
pub mod run;
pub mod setup;
pub mod status;

use anyhow::Result;
use chrono::Local;

use crate::args::GlobalOptions;
use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::config::validation::validate_auto_off_hours;
use crate::constants::{EXIT_CANCELLED, EXIT_FAILURE, EXIT_SUCCESS};
use crate::device::{DeviceConnector, DryRunConnector, KasaConnector};
use crate::engine::{RunOutcome, RunnerOptions};
use crate::error::SolError;
use crate::profiles::ProfileCatalog;
use crate::time_source::{RealTimeSource, SimulatedTimeSource, TimeSource};

/// Everything a command needs, resolved once at startup.
pub struct Session {
    pub options: GlobalOptions,
    pub config: Config,
    pub catalog: ProfileCatalog,
    pub clock: Box<dyn TimeSource>,
    pub token: CancellationToken,
}

impl Session {
    pub fn new(options: GlobalOptions, config: Config, token: CancellationToken) -> Self {
        let clock: Box<dyn TimeSource> = match options.speed {
            Some(multiplier) => Box::new(SimulatedTimeSource::accelerated(Local::now(), multiplier)),
            None => Box::new(RealTimeSource),
        };
        Self {
            options,
            config,
            catalog: ProfileCatalog::builtin(),
            clock,
            token,
        }
    }

    pub fn address(&self) -> &str {
        self.options.ip.as_deref().unwrap_or(self.config.bulb_ip())
    }

    pub fn profile(&self) -> &str {
        self.options.profile.as_deref().unwrap_or(self.config.profile())
    }

    pub fn wake_time(&self) -> &str {
        self.config.wake_time()
    }

    pub fn auto_off_hours(&self) -> Result<f64> {
        let hours = self
            .options
            .auto_off_hours
            .unwrap_or(self.config.auto_off_hours());
        validate_auto_off_hours(hours)?;
        Ok(hours)
    }

    pub fn connector(&self) -> Box<dyn DeviceConnector> {
        if self.options.dry_run {
            Box::new(DryRunConnector { verbose: true })
        } else {
            Box::new(KasaConnector::new(
                self.config.device_timeout(),
                self.options.debug_enabled,
            ))
        }
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            step_failure_budget: self.config.step_failure_budget(),
            debug_enabled: self.options.debug_enabled,
        }
    }
}

/// Exit code for a finished run.
pub fn exit_code(outcome: &RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Completed => EXIT_SUCCESS,
        RunOutcome::Cancelled => EXIT_CANCELLED,
        RunOutcome::Failed(_) => EXIT_FAILURE,
    }
}

/// Log a scheduling error; unknown profiles also list the names that exist.
pub(crate) fn report_sol_error(err: &SolError) {
    log_pipe!();
    log_error!("{}", err);
    if let SolError::UnknownProfile { available, .. } = err {
        log_indented!("Available: {}", available.join(", "));
    }
    log_end!();
}
