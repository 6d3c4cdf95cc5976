//! Per-step brightness and color temperature within a phase.

use crate::constants::{
    MAXIMUM_BRIGHTNESS, MINIMUM_BRIGHTNESS, OSCILLATION_AMPLITUDE, OSCILLATION_RATE,
};
use crate::profiles::Phase;

/// Compute the (brightness, temperature) pair for one step of a phase.
///
/// `progress` is the position within the phase and is clamped to [0, 1).
/// Brightness rounds to the nearest percent; temperature truncates toward the
/// phase's start value so it never overshoots the end of the phase. When the
/// phase oscillates, `step_index` drives a small sine perturbation of
/// brightness only.
pub fn interpolate(phase: &Phase, progress: f64, step_index: u32) -> (u8, u16) {
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0 - f64::EPSILON)
    };

    let start_b = f64::from(phase.start_brightness);
    let end_b = f64::from(phase.end_brightness);
    let mut brightness = start_b + (end_b - start_b) * progress;

    if phase.oscillate {
        brightness += OSCILLATION_AMPLITUDE * (f64::from(step_index) * OSCILLATION_RATE).sin();
    }

    let brightness = brightness.round().clamp(
        f64::from(MINIMUM_BRIGHTNESS),
        f64::from(MAXIMUM_BRIGHTNESS),
    ) as u8;

    let start_t = i64::from(phase.start_temperature);
    let end_t = i64::from(phase.end_temperature);
    let offset = ((end_t - start_t) as f64 * progress).trunc() as i64;
    let (low, high) = phase.temperature_bounds();
    let temperature = (start_t + offset).clamp(i64::from(low), i64::from(high)) as u16;

    (brightness, temperature)
}
