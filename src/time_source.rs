//! Time source abstraction for real and simulated time.
//!
//! Every component that reads the clock or sleeps takes a `&dyn TimeSource`,
//! so a whole sunrise can be rehearsed at high speed (`--speed`) or driven
//! instantly in tests without touching the wall clock.

use chrono::{DateTime, Duration as ChronoDuration, Local};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration as StdDuration, Instant};

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Local>;

    /// Sleep for the specified duration (or simulate it)
    fn sleep(&self, duration: StdDuration);

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Simulated time source for tests and time-accelerated rehearsals.
///
/// Two modes:
/// - Linear acceleration: simulated time flows at a constant multiple of real time
/// - Fast-forward: sleeping advances the clock instantly (multiplier = 0.0)
pub struct SimulatedTimeSource {
    start_time: DateTime<Local>,
    /// Time acceleration factor (e.g., 60.0 = 1 minute per second), 0.0 = fast-forward
    time_multiplier: f64,
    /// Fast-forward mode: the current simulated time
    fast_forward_current: Mutex<DateTime<Local>>,
    /// Accelerated mode: the real instant the simulation started
    real_start: Instant,
}

impl SimulatedTimeSource {
    /// Clock that jumps forward by exactly the requested amount on every sleep.
    pub fn fast_forward(start_time: DateTime<Local>) -> Self {
        Self::new(start_time, 0.0)
    }

    /// Clock that runs `multiplier` times faster than real time.
    ///
    /// A non-positive multiplier falls back to fast-forward.
    pub fn accelerated(start_time: DateTime<Local>, multiplier: f64) -> Self {
        Self::new(start_time, multiplier)
    }

    fn new(start_time: DateTime<Local>, multiplier: f64) -> Self {
        Self {
            start_time,
            time_multiplier: if multiplier > 0.0 { multiplier } else { 0.0 },
            fast_forward_current: Mutex::new(start_time),
            real_start: Instant::now(),
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.time_multiplier
    }

    /// Move the clock forward without sleeping (fast-forward mode only).
    pub fn advance(&self, by: StdDuration) {
        if self.time_multiplier == 0.0 {
            let mut current = self
                .fast_forward_current
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *current += chrono_duration(by);
        }
    }

    fn current_time(&self) -> DateTime<Local> {
        if self.time_multiplier == 0.0 {
            *self
                .fast_forward_current
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
        } else {
            let simulated_secs = self.real_start.elapsed().as_secs_f64() * self.time_multiplier;
            self.start_time + chrono_duration(StdDuration::from_secs_f64(simulated_secs))
        }
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Local> {
        self.current_time()
    }

    fn sleep(&self, duration: StdDuration) {
        if self.time_multiplier == 0.0 {
            self.advance(duration);
        } else {
            let real_sleep_secs = duration.as_secs_f64() / self.time_multiplier;
            if real_sleep_secs > 0.0 {
                std::thread::sleep(StdDuration::from_secs_f64(real_sleep_secs));
            }
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Convert a std duration to chrono, saturating on overflow.
pub fn chrono_duration(duration: StdDuration) -> ChronoDuration {
    ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::MAX)
}

/// `from + duration`, or `None` when the result falls outside chrono's range.
pub fn checked_after(from: DateTime<Local>, duration: StdDuration) -> Option<DateTime<Local>> {
    ChronoDuration::from_std(duration)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
}

/// Non-negative std duration between two instants (zero if `to` is in the past).
pub fn until(from: DateTime<Local>, to: DateTime<Local>) -> StdDuration {
    (to - from).to_std().unwrap_or(StdDuration::ZERO)
}
