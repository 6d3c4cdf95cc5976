//! A short scripted light show for checking a bulb end to end.
//!
//! Quick ramp from dark to bright, twenty seconds of erratic pulsing, then a
//! settle into the standard wake light before switching off. Runs in about
//! 40 seconds and follows the same connect, failure and cancellation rules as
//! a sunrise.

use std::time::Duration;

use super::{Abort, PowerUpError, RunOutcome, RunPhase, RunReport, RunState, RunnerOptions};
use super::{ProgressSink, StepUpdate, SunriseRunner};
use crate::cancel::{CancellationToken, Interrupted, sleep_until};
use crate::device::{DeviceConnector, LightDevice};
use crate::error::SolError;
use crate::time_source::{TimeSource, chrono_duration};

const PULSES: [(u8, u16); 20] = [
    (30, 2700),
    (90, 4500),
    (20, 2500),
    (100, 6000),
    (40, 3000),
    (80, 5000),
    (15, 2500),
    (95, 4000),
    (50, 3500),
    (70, 5500),
    (25, 2700),
    (100, 4500),
    (35, 3000),
    (85, 5000),
    (45, 2800),
    (75, 4200),
    (55, 3800),
    (65, 5200),
    (30, 2600),
    (100, 4000),
];

const RAMP_STEPS: u32 = 15;
const SETTLE_STEPS: u32 = 5;
const WAKE_LIGHT: (u8, u16) = (100, 4000);

/// One scripted light setting and how long it is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoCue {
    pub section: usize,
    pub brightness: u8,
    pub temperature: u16,
    pub hold: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoScript {
    pub sections: Vec<&'static str>,
    pub cues: Vec<DemoCue>,
}

impl DemoScript {
    pub fn standard() -> Self {
        let mut cues = Vec::new();

        for i in 0..RAMP_STEPS {
            let brightness = 1 + 99 * i / (RAMP_STEPS - 1);
            let temperature = 2500 + 1500 * i / (RAMP_STEPS - 1);
            cues.push(DemoCue {
                section: 0,
                brightness: brightness as u8,
                temperature: temperature as u16,
                hold: Duration::from_secs(1),
            });
        }

        cues.extend(PULSES.iter().map(|&(brightness, temperature)| DemoCue {
            section: 1,
            brightness,
            temperature,
            hold: Duration::from_secs(1),
        }));

        for i in 0..SETTLE_STEPS {
            let brightness = 100 - 20 * (SETTLE_STEPS - 1 - i) / (SETTLE_STEPS - 1);
            cues.push(DemoCue {
                section: 2,
                brightness: brightness as u8,
                temperature: WAKE_LIGHT.1,
                hold: Duration::from_millis(500),
            });
        }

        cues.push(DemoCue {
            section: 2,
            brightness: WAKE_LIGHT.0,
            temperature: WAKE_LIGHT.1,
            hold: Duration::from_secs(2),
        });

        Self {
            sections: vec![
                "Dark to light ramp",
                "Weird pulsing",
                "Settling to optimal wake light",
            ],
            cues,
        }
    }

    pub fn duration(&self) -> Duration {
        self.cues.iter().map(|cue| cue.hold).sum()
    }
}

/// Play `script` on the bulb at `address`, switching it off at the end.
pub fn run_demo(
    script: &DemoScript,
    connector: &dyn DeviceConnector,
    address: &str,
    clock: &dyn TimeSource,
    token: CancellationToken,
    sink: &mut dyn ProgressSink,
) -> RunReport {
    SunriseRunner::new(clock, token, RunnerOptions::default()).play(script, address, connector, sink)
}

impl SunriseRunner<'_> {
    fn play(
        &self,
        script: &DemoScript,
        address: &str,
        connector: &dyn DeviceConnector,
        sink: &mut dyn ProgressSink,
    ) -> RunReport {
        let mut state = RunState::new(self.options.debug_enabled);
        let mut device: Option<Box<dyn LightDevice>> = None;

        let result = self.play_cues(script, address, connector, sink, &mut state, &mut device);

        let outcome = match result {
            Ok(()) => {
                state.enter(RunPhase::Completed);
                RunOutcome::Completed
            }
            Err(Abort::Cancelled) => {
                state.enter(RunPhase::Cancelled);
                RunOutcome::Cancelled
            }
            Err(Abort::Failed(err)) => {
                state.enter(RunPhase::Failed);
                RunOutcome::Failed(err)
            }
        };

        // The show always ends dark, whether it finished or not.
        if let Some(device) = device.as_mut() {
            if let Err(e) = device.turn_off() {
                log_warning!("Could not turn the bulb off after the demo: {e}");
            }
        }

        sink.on_finish(&outcome);

        RunReport {
            outcome,
            steps_total: script.cues.len() as u32,
            steps_applied: state.steps_applied,
            steps_skipped: state.steps_skipped,
            last_emitted: state.last_emitted,
            finished_at: self.clock.now(),
        }
    }

    fn play_cues(
        &self,
        script: &DemoScript,
        address: &str,
        connector: &dyn DeviceConnector,
        sink: &mut dyn ProgressSink,
        state: &mut RunState,
        device: &mut Option<Box<dyn LightDevice>>,
    ) -> Result<(), Abort> {
        state.enter(RunPhase::RunningPhase(0));
        let connected = device.insert(self.connect(connector, address)?);

        let (brightness, temperature) = script
            .cues
            .first()
            .map_or((1, 2500), |cue| (cue.brightness, cue.temperature));
        self.power_up(connected.as_mut(), brightness, temperature)
            .map_err(|e| match e {
                PowerUpError::Interrupted => Abort::Cancelled,
                PowerUpError::Device(err) => Abort::Failed(SolError::from(err)),
            })?;
        state.last_emitted = Some((brightness, temperature));

        let total_sections = script.sections.len();
        let started = self.clock.now();
        let mut offset = Duration::ZERO;
        let mut current_section = None;

        for cue in &script.cues {
            if self.token.is_cancelled() {
                return Err(Abort::Cancelled);
            }
            if current_section != Some(cue.section) {
                current_section = Some(cue.section);
                if cue.section > 0 {
                    state.enter(RunPhase::RunningPhase(cue.section));
                }
                let title = script.sections.get(cue.section).copied().unwrap_or("Interlude");
                sink.on_phase_start(cue.section, total_sections, title);
            }

            self.apply_step(connected.as_mut(), state, cue.brightness, cue.temperature)?;
            sink.on_step(&StepUpdate {
                phase_index: cue.section,
                total_phases: total_sections,
                brightness: cue.brightness,
                temperature: cue.temperature,
            });

            offset += cue.hold;
            sleep_until(self.clock, started + chrono_duration(offset), &self.token)
                .map_err(|Interrupted| Abort::Cancelled)?;
        }

        Ok(())
    }
}
