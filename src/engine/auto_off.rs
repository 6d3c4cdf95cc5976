//! Switch the bulb off again some hours after a completed sunrise.

use chrono::{DateTime, Local};
use std::time::Duration;

use crate::cancel::{CancellationToken, Interrupted, sleep_for};
use crate::device::DeviceConnector;
use crate::error::SolError;
use crate::time_source::{TimeSource, checked_after};

#[derive(Debug, Clone, PartialEq)]
pub enum AutoOffOutcome {
    /// Delay was zero, nothing armed.
    Disabled,
    Cancelled,
    TurnedOff(DateTime<Local>),
    Failed(SolError),
}

pub struct AutoOffSupervisor<'a> {
    clock: &'a dyn TimeSource,
    token: CancellationToken,
}

impl<'a> AutoOffSupervisor<'a> {
    pub fn new(clock: &'a dyn TimeSource, token: CancellationToken) -> Self {
        Self { clock, token }
    }

    /// Wait `delay_hours`, then power the bulb off.
    ///
    /// The device is only contacted once the delay has elapsed, so a bulb that
    /// was unplugged in the meantime costs nothing until then.
    pub fn arm(
        &self,
        delay_hours: f64,
        address: &str,
        connector: &dyn DeviceConnector,
    ) -> AutoOffOutcome {
        if !delay_hours.is_finite() || delay_hours <= 0.0 {
            return AutoOffOutcome::Disabled;
        }

        let scheduled = Duration::try_from_secs_f64(delay_hours * 3600.0)
            .ok()
            .and_then(|delay| Some((delay, checked_after(self.clock.now(), delay)?)));
        let Some((delay, off_at)) = scheduled else {
            log_warning!("Auto-off delay of {delay_hours}h cannot be scheduled");
            return AutoOffOutcome::Failed(SolError::InvalidDelay(format!(
                "{delay_hours}h is beyond the supported calendar range"
            )));
        };
        log_block_start!(
            "Auto-off armed for {} ({delay_hours}h)",
            off_at.format("%H:%M")
        );

        if let Err(Interrupted) = sleep_for(self.clock, delay, &self.token) {
            log_indented!("Auto-off cancelled");
            return AutoOffOutcome::Cancelled;
        }

        let result = connector
            .connect(address)
            .and_then(|mut device| device.turn_off());
        match result {
            Ok(()) => {
                let now = self.clock.now();
                log_block_start!("Bulb switched off at {}", now.format("%H:%M"));
                AutoOffOutcome::TurnedOff(now)
            }
            Err(e) => {
                log_warning!("Auto-off could not switch the bulb off: {e}");
                AutoOffOutcome::Failed(SolError::from(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceError, MockDeviceConnector, MockLightDevice};
    use crate::time_source::SimulatedTimeSource;
    use chrono::TimeZone;

    fn clock() -> SimulatedTimeSource {
        SimulatedTimeSource::fast_forward(Local.with_ymd_and_hms(2026, 4, 1, 7, 0, 0).unwrap())
    }

    #[test]
    fn test_zero_delay_is_disabled() {
        let clock = clock();
        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().never();

        let supervisor = AutoOffSupervisor::new(&clock, CancellationToken::new());
        assert_eq!(supervisor.arm(0.0, "bulb", &connector), AutoOffOutcome::Disabled);
    }

    #[test]
    fn test_turns_off_after_delay() {
        let clock = clock();
        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().times(1).returning(|_| {
            let mut device = MockLightDevice::new();
            device.expect_turn_off().times(1).returning(|| Ok(()));
            Ok(Box::new(device))
        });

        let supervisor = AutoOffSupervisor::new(&clock, CancellationToken::new());
        let outcome = supervisor.arm(1.5, "bulb", &connector);

        assert_eq!(
            outcome,
            AutoOffOutcome::TurnedOff(Local.with_ymd_and_hms(2026, 4, 1, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_delay_past_calendar_range_fails_without_contacting_bulb() {
        let clock = clock();
        let token = CancellationToken::new();
        token.cancel();
        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().never();

        let supervisor = AutoOffSupervisor::new(&clock, token);
        for hours in [1e10, f64::MAX] {
            assert!(
                matches!(
                    supervisor.arm(hours, "bulb", &connector),
                    AutoOffOutcome::Failed(SolError::InvalidDelay(_))
                ),
                "{hours}"
            );
        }
    }

    #[test]
    fn test_cancelled_before_delay_never_connects() {
        let clock = clock();
        let token = CancellationToken::new();
        token.cancel();
        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().never();

        let supervisor = AutoOffSupervisor::new(&clock, token);
        assert_eq!(supervisor.arm(2.0, "bulb", &connector), AutoOffOutcome::Cancelled);
    }

    #[test]
    fn test_unreachable_bulb_reports_failure() {
        let clock = clock();
        let mut connector = MockDeviceConnector::new();
        connector.expect_connect().returning(|address| {
            Err(DeviceError::Connection {
                address: address.to_string(),
                reason: "timed out".into(),
            })
        });

        let supervisor = AutoOffSupervisor::new(&clock, CancellationToken::new());
        assert!(matches!(
            supervisor.arm(0.25, "bulb", &connector),
            AutoOffOutcome::Failed(SolError::Connection { .. })
        ));
    }
}
