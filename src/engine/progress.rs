//! Values the engine reports while it runs.
//!
//! Renderers implement [`ProgressSink`]; every method has a no-op default so a
//! sink only overrides what it draws.

use chrono::{DateTime, Local};
use std::time::Duration;

use super::RunOutcome;

/// One paced step, exactly as it was sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepUpdate {
    pub phase_index: usize,
    pub total_phases: usize,
    pub brightness: u8,
    pub temperature: u16,
}

pub trait ProgressSink {
    /// Periodic tick while waiting for the start instant.
    fn on_countdown(&mut self, _remaining: Duration, _start: DateTime<Local>) {}

    /// A new phase (or demo section) begins.
    fn on_phase_start(&mut self, _index: usize, _total: usize, _description: &str) {}

    fn on_step(&mut self, _update: &StepUpdate) {}

    fn on_finish(&mut self, _outcome: &RunOutcome) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {}

/// Keeps every update, for tests and post-run summaries.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    pub countdowns: Vec<Duration>,
    pub phases: Vec<String>,
    pub steps: Vec<StepUpdate>,
    pub outcome: Option<RunOutcome>,
}

impl ProgressSink for RecordingProgress {
    fn on_countdown(&mut self, remaining: Duration, _start: DateTime<Local>) {
        self.countdowns.push(remaining);
    }

    fn on_phase_start(&mut self, _index: usize, _total: usize, description: &str) {
        self.phases.push(description.to_string());
    }

    fn on_step(&mut self, update: &StepUpdate) {
        self.steps.push(*update);
    }

    fn on_finish(&mut self, outcome: &RunOutcome) {
        self.outcome = Some(outcome.clone());
    }
}
