//! Range and format checks for `sol.toml`.

use anyhow::Result;

use super::Config;
use crate::constants::*;
use crate::schedule::parse_clock_time;

pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(ip) = config.bulb_ip.as_deref()
        && ip.trim().is_empty()
    {
        anyhow::bail!("bulb_ip must not be empty");
    }

    if let Some(profile) = config.profile.as_deref()
        && profile.trim().is_empty()
    {
        anyhow::bail!("profile must not be empty");
    }

    if let Some(wake_time) = config.wake_time.as_deref() {
        parse_clock_time(wake_time).map_err(|e| anyhow::anyhow!("wake_time: {e}"))?;
    }

    if let Some(hours) = config.auto_off_hours
        && !(MINIMUM_AUTO_OFF_HOURS..=MAXIMUM_AUTO_OFF_HOURS).contains(&hours)
    {
        anyhow::bail!(
            "auto_off_hours ({}) must be between {} and {} hours",
            hours,
            MINIMUM_AUTO_OFF_HOURS,
            MAXIMUM_AUTO_OFF_HOURS
        );
    }

    if let Some(timeout) = config.device_timeout_ms
        && !(MINIMUM_DEVICE_TIMEOUT_MS..=MAXIMUM_DEVICE_TIMEOUT_MS).contains(&timeout)
    {
        anyhow::bail!(
            "device_timeout_ms ({} ms) must be between {} and {} milliseconds",
            timeout,
            MINIMUM_DEVICE_TIMEOUT_MS,
            MAXIMUM_DEVICE_TIMEOUT_MS
        );
    }

    if let Some(budget) = config.step_failure_budget
        && !(MINIMUM_STEP_FAILURE_BUDGET..=MAXIMUM_STEP_FAILURE_BUDGET).contains(&budget)
    {
        anyhow::bail!(
            "step_failure_budget ({}) must be between {} and {}",
            budget,
            MINIMUM_STEP_FAILURE_BUDGET,
            MAXIMUM_STEP_FAILURE_BUDGET
        );
    }

    Ok(())
}

/// Check an auto-off value given on the command line.
pub fn validate_auto_off_hours(hours: f64) -> Result<()> {
    if !hours.is_finite() || !(MINIMUM_AUTO_OFF_HOURS..=MAXIMUM_AUTO_OFF_HOURS).contains(&hours) {
        anyhow::bail!(
            "auto-off ({}) must be between {} and {} hours",
            hours,
            MINIMUM_AUTO_OFF_HOURS,
            MAXIMUM_AUTO_OFF_HOURS
        );
    }
    Ok(())
}
