//! `now`, `at` and `up`: schedule a sunrise and run it to completion.

use anyhow::{Context, Result};

use super::{Session, exit_code, report_sol_error};
use crate::constants::{EXIT_CANCELLED, EXIT_FAILURE};
use crate::display::TerminalProgress;
use crate::engine::auto_off::{AutoOffOutcome, AutoOffSupervisor};
use crate::engine::{RunOutcome, SunriseRunner};
use crate::schedule::{Anchor, ResolvedSchedule, ScheduleRequest, resolve};
use crate::utils::{TerminalGuard, format_wait};

/// Build the request for an anchor from the session's profile and address.
pub fn request_for(session: &Session, anchor: Anchor) -> Result<ScheduleRequest> {
    Ok(
        ScheduleRequest::new(session.address(), session.profile(), anchor)
            .with_auto_off(session.auto_off_hours()?),
    )
}

pub fn run_now(session: &Session) -> Result<i32> {
    run_request(session, &request_for(session, Anchor::StartNow)?)
}

/// Sunrise starting at `time`, or at the configured wake time.
pub fn run_at(session: &Session, time: Option<&str>) -> Result<i32> {
    let time = time.unwrap_or(session.wake_time()).to_string();
    run_request(session, &request_for(session, Anchor::StartAt(time))?)
}

/// Sunrise completing at `time`, or at the configured wake time.
pub fn run_up(session: &Session, time: Option<&str>) -> Result<i32> {
    let time = time.unwrap_or(session.wake_time()).to_string();
    run_request(session, &request_for(session, Anchor::CompleteAt(time))?)
}

/// Resolve and execute a request, then arm auto-off if asked to.
pub fn run_request(session: &Session, request: &ScheduleRequest) -> Result<i32> {
    let schedule = match resolve(request, &session.catalog, session.clock.now()) {
        Ok(schedule) => schedule,
        Err(err) => {
            report_sol_error(&err);
            return Ok(EXIT_FAILURE);
        }
    };

    show_schedule(session, request, &schedule);

    let _term = TerminalGuard::new().context("failed to initialize terminal features")?;
    let connector = session.connector();
    let runner = SunriseRunner::new(
        session.clock.as_ref(),
        session.token.clone(),
        session.runner_options(),
    );
    let mut progress = TerminalProgress::sunrise();
    let report = runner.run(&schedule, &request.address, connector.as_ref(), &mut progress);

    if session.options.debug_enabled {
        log_debug!(
            "Steps: {} planned, {} applied, {} skipped",
            report.steps_total,
            report.steps_applied,
            report.steps_skipped
        );
    }

    if report.outcome == RunOutcome::Completed && request.auto_off_hours > 0.0 {
        let supervisor = AutoOffSupervisor::new(session.clock.as_ref(), session.token.clone());
        match supervisor.arm(request.auto_off_hours, &request.address, connector.as_ref()) {
            AutoOffOutcome::Failed(_) => {
                log_end!();
                return Ok(EXIT_FAILURE);
            }
            AutoOffOutcome::Cancelled => {
                log_end!();
                return Ok(EXIT_CANCELLED);
            }
            AutoOffOutcome::Disabled | AutoOffOutcome::TurnedOff(_) => {}
        }
    }

    log_end!();
    Ok(exit_code(&report.outcome))
}

fn show_schedule(session: &Session, request: &ScheduleRequest, schedule: &ResolvedSchedule) {
    log_version!();
    let profile = &schedule.profile;
    log_block_start!("Sunrise: {} ({})", profile.label, request.anchor.describe());
    log_indented!("{}", profile.description);
    log_indented!("Bulb: {}", request.address);
    log_indented!("Starts at:    {}", schedule.start.format("%Y-%m-%d %H:%M"));
    log_indented!(
        "Completes at: {} ({} min later)",
        schedule.end.format("%H:%M"),
        profile.duration_minutes
    );

    let wait = schedule.wait_from(session.clock.now());
    if !wait.is_zero() {
        log_indented!("Waiting:      {}", format_wait(wait));
    }
    if session.options.dry_run {
        log_indented!("Dry run: no commands are sent to the bulb");
    }
    if let Some(multiplier) = session.options.speed {
        log_indented!("Clock running {multiplier}x faster than real time");
    }
    log_pipe!();
    log_info!("Press Ctrl+C to cancel");
}
