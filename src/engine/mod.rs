//! The sunrise execution loop.
//!
//! [`SunriseRunner::run`] takes a resolved schedule and walks it against a
//! device:
//!
//! ```text
//! Idle → WaitingForStart → RunningPhase(0) → … → RunningPhase(n-1) → Completed
//!                 ↘ Cancelled            ↘ Cancelled / Failed
//! ```
//!
//! ## Pacing
//!
//! Step deadlines are computed from the instant the first phase began, not
//! from the end of the previous sleep, so slow device calls do not push the
//! whole sunrise later. A step that overruns its slot simply starts the next
//! one immediately.
//!
//! ## Failure policy
//!
//! Reaching the device and powering it on is all-or-nothing: if that fails the
//! run is `Failed`. After that a failed step is logged and skipped while
//! pacing continues, up to a budget of consecutive failures.
//!
//! ## Cancellation
//!
//! The token is checked at the top of every phase and at every sleep. A run
//! cancelled after the device was reached sends exactly one best-effort
//! power-off; a run cancelled while still waiting touches nothing.

pub mod auto_off;
pub mod demo;
pub mod progress;

use chrono::{DateTime, Duration as ChronoDuration, Local};
use std::time::Duration;

use crate::cancel::{CancellationToken, Interrupted, sleep_for, sleep_until};
use crate::constants::{
    CONNECT_RETRY_DELAY_MS, COUNTDOWN_REPORT_INTERVAL_SECS, DEFAULT_STEP_FAILURE_BUDGET,
    POWER_CYCLE_SETTLE_MS,
};
use crate::device::{DeviceConnector, DeviceError, LightDevice};
use crate::error::SolError;
use crate::interpolate::interpolate;
use crate::schedule::ResolvedSchedule;
use crate::time_source::{TimeSource, chrono_duration, until};

pub use progress::{NullProgress, ProgressSink, RecordingProgress, StepUpdate};

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed(SolError),
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    WaitingForStart,
    RunningPhase(usize),
    Completed,
    Cancelled,
    Failed,
}

/// Summary handed back to the caller once the run is over.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Paced steps in the schedule.
    pub steps_total: u32,
    /// Steps whose device writes succeeded.
    pub steps_applied: u32,
    /// Steps whose device writes failed and were skipped.
    pub steps_skipped: u32,
    /// Last (brightness, temperature) forwarded to the device.
    pub last_emitted: Option<(u8, u16)>,
    pub finished_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Consecutive failed steps tolerated before the run is abandoned.
    pub step_failure_budget: u32,
    pub debug_enabled: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            step_failure_budget: DEFAULT_STEP_FAILURE_BUDGET,
            debug_enabled: false,
        }
    }
}

// Transient per-run bookkeeping.
struct RunState {
    phase: RunPhase,
    step_index: u32,
    last_emitted: Option<(u8, u16)>,
    consecutive_failures: u32,
    steps_applied: u32,
    steps_skipped: u32,
    debug_enabled: bool,
}

impl RunState {
    fn new(debug_enabled: bool) -> Self {
        Self {
            phase: RunPhase::Idle,
            step_index: 0,
            last_emitted: None,
            consecutive_failures: 0,
            steps_applied: 0,
            steps_skipped: 0,
            debug_enabled,
        }
    }

    fn enter(&mut self, next: RunPhase) {
        if self.debug_enabled {
            log_debug!("Run state: {:?} → {:?}", self.phase, next);
        }
        self.phase = next;
        self.step_index = 0;
    }
}

enum Abort {
    Cancelled,
    Failed(SolError),
}

pub struct SunriseRunner<'a> {
    clock: &'a dyn TimeSource,
    token: CancellationToken,
    options: RunnerOptions,
}

impl<'a> SunriseRunner<'a> {
    pub fn new(clock: &'a dyn TimeSource, token: CancellationToken, options: RunnerOptions) -> Self {
        Self {
            clock,
            token,
            options,
        }
    }

    /// Execute `schedule` against the bulb at `address`.
    ///
    /// Blocks until the sunrise completes, is cancelled, or fails. Never
    /// panics on device errors; the outcome is in the returned report.
    pub fn run(
        &self,
        schedule: &ResolvedSchedule,
        address: &str,
        connector: &dyn DeviceConnector,
        sink: &mut dyn ProgressSink,
    ) -> RunReport {
        let mut state = RunState::new(self.options.debug_enabled);
        let mut device: Option<Box<dyn LightDevice>> = None;

        let result = self.drive(schedule, address, connector, sink, &mut state, &mut device);

        let outcome = match result {
            Ok(()) => {
                state.enter(RunPhase::Completed);
                RunOutcome::Completed
            }
            Err(Abort::Cancelled) => {
                state.enter(RunPhase::Cancelled);
                if let Some(device) = device.as_mut() {
                    match device.turn_off() {
                        Ok(()) => log_indented!("Bulb switched off"),
                        Err(e) => log_warning!("Could not turn the bulb off after cancelling: {e}"),
                    }
                }
                RunOutcome::Cancelled
            }
            Err(Abort::Failed(err)) => {
                state.enter(RunPhase::Failed);
                RunOutcome::Failed(err)
            }
        };

        sink.on_finish(&outcome);

        RunReport {
            outcome,
            steps_total: schedule.total_steps(),
            steps_applied: state.steps_applied,
            steps_skipped: state.steps_skipped,
            last_emitted: state.last_emitted,
            finished_at: self.clock.now(),
        }
    }

    fn drive(
        &self,
        schedule: &ResolvedSchedule,
        address: &str,
        connector: &dyn DeviceConnector,
        sink: &mut dyn ProgressSink,
        state: &mut RunState,
        device: &mut Option<Box<dyn LightDevice>>,
    ) -> Result<(), Abort> {
        state.enter(RunPhase::WaitingForStart);
        self.wait_for_start(schedule.start, sink)?;

        state.enter(RunPhase::RunningPhase(0));
        let connected = device.insert(self.connect(connector, address)?);

        let first_plan = schedule
            .phases
            .first()
            .ok_or_else(|| Abort::Failed(SolError::InvalidProfile("schedule has no phases".into())))?;
        let (first_brightness, first_temperature) = interpolate(&first_plan.phase, 0.0, 0);
        self.power_up(connected.as_mut(), first_brightness, first_temperature)
            .map_err(|e| match e {
                PowerUpError::Interrupted => Abort::Cancelled,
                PowerUpError::Device(err) => Abort::Failed(SolError::from(err)),
            })?;
        state.last_emitted = Some((first_brightness, first_temperature));

        let run_start = self.clock.now();
        let mut scheduled_offset = Duration::ZERO;
        let total_phases = schedule.phases.len();

        for (phase_index, plan) in schedule.phases.iter().enumerate() {
            if self.token.is_cancelled() {
                return Err(Abort::Cancelled);
            }
            if phase_index > 0 {
                state.enter(RunPhase::RunningPhase(phase_index));
            }

            let phase = &plan.phase;
            sink.on_phase_start(
                phase_index,
                total_phases,
                &format!(
                    "Phase {}: {}%→{}% brightness, {}K→{}K",
                    phase_index + 1,
                    phase.start_brightness,
                    phase.end_brightness,
                    phase.start_temperature,
                    phase.end_temperature
                ),
            );

            for step in 0..plan.steps {
                state.step_index = step;
                let progress = f64::from(step) / f64::from(plan.steps);
                let (brightness, temperature) = interpolate(phase, progress, step);

                self.apply_step(connected.as_mut(), state, brightness, temperature)?;
                sink.on_step(&StepUpdate {
                    phase_index,
                    total_phases,
                    brightness,
                    temperature,
                });

                scheduled_offset += plan.step_delay;
                let deadline = run_start + chrono_duration(scheduled_offset);
                if self.options.debug_enabled {
                    let lag = self.clock.now() - deadline;
                    if lag > ChronoDuration::seconds(1) {
                        log_debug!("Step {step} of phase {} running {lag} late", phase_index + 1);
                    }
                }
                sleep_until(self.clock, deadline, &self.token).map_err(|Interrupted| Abort::Cancelled)?;
            }
        }

        // Land exactly on the profile's final values.
        if let Some((brightness, temperature)) = schedule.profile.final_values() {
            match write_levels(connected.as_mut(), brightness, temperature) {
                Ok(()) => state.last_emitted = Some((brightness, temperature)),
                Err(e) => log_warning!("Final sunrise values not applied: {e}"),
            }
            sink.on_step(&StepUpdate {
                phase_index: total_phases.saturating_sub(1),
                total_phases,
                brightness,
                temperature,
            });
        }

        Ok(())
    }

    fn wait_for_start(
        &self,
        start: DateTime<Local>,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), Abort> {
        let report_every = ChronoDuration::seconds(COUNTDOWN_REPORT_INTERVAL_SECS as i64);
        loop {
            if self.token.is_cancelled() {
                return Err(Abort::Cancelled);
            }
            let now = self.clock.now();
            let remaining = until(now, start);
            if remaining.is_zero() {
                return Ok(());
            }
            sink.on_countdown(remaining, start);
            let next_report = (now + report_every).min(start);
            sleep_until(self.clock, next_report, &self.token).map_err(|Interrupted| Abort::Cancelled)?;
        }
    }

    // One connection attempt plus a single retry after a short pause.
    fn connect(
        &self,
        connector: &dyn DeviceConnector,
        address: &str,
    ) -> Result<Box<dyn LightDevice>, Abort> {
        match connector.connect(address) {
            Ok(device) => Ok(device),
            Err(first) => {
                log_warning!("Bulb not reachable ({first}), retrying once");
                sleep_for(
                    self.clock,
                    Duration::from_millis(CONNECT_RETRY_DELAY_MS),
                    &self.token,
                )
                .map_err(|Interrupted| Abort::Cancelled)?;
                connector
                    .connect(address)
                    .map_err(|e| Abort::Failed(SolError::from(e)))
            }
        }
    }

    // Start from darkness, then light the first step.
    fn power_up(
        &self,
        device: &mut dyn LightDevice,
        brightness: u8,
        temperature: u16,
    ) -> Result<(), PowerUpError> {
        device.refresh_state().map_err(PowerUpError::Device)?;
        device.turn_off().map_err(PowerUpError::Device)?;
        sleep_for(
            self.clock,
            Duration::from_millis(POWER_CYCLE_SETTLE_MS),
            &self.token,
        )
        .map_err(|Interrupted| PowerUpError::Interrupted)?;
        write_levels(device, brightness, temperature).map_err(PowerUpError::Device)?;
        device.turn_on().map_err(PowerUpError::Device)
    }

    fn apply_step(
        &self,
        device: &mut dyn LightDevice,
        state: &mut RunState,
        brightness: u8,
        temperature: u16,
    ) -> Result<(), Abort> {
        let result = device.set_brightness(brightness).and_then(|()| {
            // Brightness is on the bulb even if the temperature write fails
            state.last_emitted = state.last_emitted.map(|(_, t)| (brightness, t));
            device.set_color_temperature(temperature)
        });
        match result {
            Ok(()) => {
                state.steps_applied += 1;
                state.consecutive_failures = 0;
                state.last_emitted = Some((brightness, temperature));
                Ok(())
            }
            Err(e) => {
                state.steps_skipped += 1;
                state.consecutive_failures += 1;
                log_warning!("Skipped step {brightness}% / {temperature}K: {e}");

                if state.consecutive_failures > self.options.step_failure_budget {
                    return Err(Abort::Failed(SolError::Communication(format!(
                        "{} consecutive steps failed, last error: {e}",
                        state.consecutive_failures
                    ))));
                }
                Ok(())
            }
        }
    }
}

enum PowerUpError {
    Interrupted,
    Device(DeviceError),
}

fn write_levels(
    device: &mut dyn LightDevice,
    brightness: u8,
    temperature: u16,
) -> Result<(), DeviceError> {
    device.set_brightness(brightness)?;
    device.set_color_temperature(temperature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MockDeviceConnector, MockLightDevice};
    use crate::profiles::ProfileCatalog;
    use crate::schedule::{Anchor, ScheduleRequest, resolve};
    use crate::time_source::SimulatedTimeSource;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    fn clock() -> SimulatedTimeSource {
        SimulatedTimeSource::fast_forward(Local.with_ymd_and_hms(2026, 2, 10, 6, 0, 0).unwrap())
    }

    fn quick_schedule(clock: &SimulatedTimeSource, anchor: Anchor) -> ResolvedSchedule {
        resolve(
            &ScheduleRequest::new("bulb", "quick", anchor),
            &ProfileCatalog::builtin(),
            clock.now(),
        )
        .unwrap()
    }

    #[test]
    fn test_unreachable_device_fails_after_one_retry() {
        let clock = clock();
        let schedule = quick_schedule(&clock, Anchor::StartNow);

        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().times(2).returning(|address| {
            Err(DeviceError::Connection {
                address: address.to_string(),
                reason: "no route to host".into(),
            })
        });

        let runner = SunriseRunner::new(&clock, CancellationToken::new(), RunnerOptions::default());
        let report = runner.run(&schedule, "bulb", &connector, &mut NullProgress);

        assert!(matches!(
            report.outcome,
            RunOutcome::Failed(SolError::Connection { .. })
        ));
        assert_eq!(report.steps_applied, 0);
    }

    #[test]
    fn test_power_on_failure_is_fatal() {
        let clock = clock();
        let schedule = quick_schedule(&clock, Anchor::StartNow);

        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().times(1).returning(|_| {
            let mut device = MockLightDevice::new();
            device
                .expect_refresh_state()
                .returning(|| Ok(Default::default()));
            device.expect_turn_off().returning(|| Ok(()));
            device.expect_set_brightness().returning(|_| Ok(()));
            device.expect_set_color_temperature().returning(|_| Ok(()));
            device
                .expect_turn_on()
                .returning(|| Err(DeviceError::Communication("reset by peer".into())));
            Ok(Box::new(device))
        });

        let runner = SunriseRunner::new(&clock, CancellationToken::new(), RunnerOptions::default());
        let report = runner.run(&schedule, "bulb", &connector, &mut NullProgress);

        assert_eq!(
            report.outcome,
            RunOutcome::Failed(SolError::Communication("reset by peer".into()))
        );
    }

    #[test]
    fn test_cancel_while_waiting_touches_no_device() {
        let clock = clock();
        let schedule = quick_schedule(&clock, Anchor::StartAt("07:00".into()));
        let token = CancellationToken::new();
        token.cancel();

        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().never();

        let runner = SunriseRunner::new(&clock, token, RunnerOptions::default());
        let mut progress = RecordingProgress::default();
        let report = runner.run(&schedule, "bulb", &connector, &mut progress);

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(progress.outcome, Some(RunOutcome::Cancelled));
        assert!(progress.steps.is_empty());
    }

    #[test]
    fn test_waiting_reports_countdown_every_minute() {
        let clock = clock();
        // 07:00 start, 60 minutes away
        let schedule = quick_schedule(&clock, Anchor::StartAt("07:00".into()));

        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().returning(|_| {
            let mut device = MockLightDevice::new();
            device
                .expect_refresh_state()
                .returning(|| Ok(Default::default()));
            device.expect_turn_off().returning(|| Ok(()));
            device.expect_turn_on().returning(|| Ok(()));
            device.expect_set_brightness().returning(|_| Ok(()));
            device.expect_set_color_temperature().returning(|_| Ok(()));
            Ok(Box::new(device))
        });

        let runner = SunriseRunner::new(&clock, CancellationToken::new(), RunnerOptions::default());
        let mut progress = RecordingProgress::default();
        let report = runner.run(&schedule, "bulb", &connector, &mut progress);

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(progress.countdowns.len(), 60);
        assert_eq!(progress.countdowns[0], Duration::from_secs(3600));
        assert!(report.finished_at >= schedule.end);
    }

    #[test]
    fn test_persistent_failures_exhaust_budget() {
        let clock = clock();
        let schedule = quick_schedule(&clock, Anchor::StartNow);

        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().returning(|_| {
            let mut device = MockLightDevice::new();
            device
                .expect_refresh_state()
                .returning(|| Ok(Default::default()));
            device.expect_turn_off().returning(|| Ok(()));
            device.expect_turn_on().returning(|| Ok(()));
            device.expect_set_color_temperature().returning(|_| Ok(()));
            // Initial levels land, every paced step after that fails
            let mut calls = 0;
            device.expect_set_brightness().returning(move |_| {
                calls += 1;
                if calls == 1 {
                    Ok(())
                } else {
                    Err(DeviceError::Communication("timed out".into()))
                }
            });
            Ok(Box::new(device))
        });

        let options = RunnerOptions {
            step_failure_budget: 5,
            debug_enabled: false,
        };
        let runner = SunriseRunner::new(&clock, CancellationToken::new(), options);
        let report = runner.run(&schedule, "bulb", &connector, &mut NullProgress);

        assert!(matches!(
            report.outcome,
            RunOutcome::Failed(SolError::Communication(_))
        ));
        assert_eq!(report.steps_skipped, 6);
        assert_eq!(report.steps_applied, 0);
    }

    #[test]
    fn test_brightness_that_lands_before_temperature_fails_is_reported() {
        let clock = clock();
        let schedule = quick_schedule(&clock, Anchor::StartNow);
        let sent = Arc::new(Mutex::new(Vec::new()));

        let mut connector = MockDeviceConnector::new();
        let recorded = Arc::clone(&sent);
        connector.expect_connect().returning(move |_| {
            let mut device = MockLightDevice::new();
            device
                .expect_refresh_state()
                .returning(|| Ok(Default::default()));
            device.expect_turn_off().returning(|| Ok(()));
            device.expect_turn_on().returning(|| Ok(()));
            let recorded = Arc::clone(&recorded);
            device.expect_set_brightness().returning(move |level| {
                recorded.lock().unwrap().push(level);
                Ok(())
            });
            // Power-up temperature lands, every paced one after that fails
            let mut calls = 0;
            device.expect_set_color_temperature().returning(move |_| {
                calls += 1;
                if calls == 1 {
                    Ok(())
                } else {
                    Err(DeviceError::Communication("timed out".into()))
                }
            });
            Ok(Box::new(device))
        });

        let options = RunnerOptions {
            step_failure_budget: 10,
            debug_enabled: false,
        };
        let runner = SunriseRunner::new(&clock, CancellationToken::new(), options);
        let report = runner.run(&schedule, "bulb", &connector, &mut NullProgress);

        assert!(matches!(
            report.outcome,
            RunOutcome::Failed(SolError::Communication(_))
        ));
        assert_eq!(report.steps_skipped, 11);
        assert_eq!(report.steps_applied, 0);

        let sent = sent.lock().unwrap();
        // Power-up write plus one per failed step
        assert_eq!(sent.len(), 12);
        let last_brightness = *sent.last().unwrap();
        assert_eq!(report.last_emitted, Some((last_brightness, 2500)));
    }
}
