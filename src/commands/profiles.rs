//! `profiles`: list the built-in sunrise profiles.

use anyhow::Result;

use super::Session;
use crate::constants::EXIT_SUCCESS;
use crate::profiles::SunriseProfile;

pub fn run_profiles_command(session: &Session) -> Result<i32> {
    log_version!();
    log_block_start!("Available sunrise profiles:");
    for profile in session.catalog.list_all() {
        log_pipe!();
        let marker = if profile.name == session.profile() {
            " (default)"
        } else {
            ""
        };
        log_indented!("{}{}", profile.name, marker);
        log_indented!("  {}", profile.label);
        log_indented!("  {}", profile.description);
        log_indented!("  Duration: {} min, {}", profile.duration_minutes, phase_summary(profile));
    }
    log_end!();
    Ok(EXIT_SUCCESS)
}

/// `3 phases, 1%→100%, 2500K→4000K`
pub fn phase_summary(profile: &SunriseProfile) -> String {
    let (Some(first), Some(last)) = (profile.phases.first(), profile.phases.last()) else {
        return "no phases".to_string();
    };
    format!(
        "{} phases, {}%→{}%, {}K→{}K",
        profile.phases.len(),
        first.start_brightness,
        last.end_brightness,
        first.start_temperature,
        last.end_temperature
    )
}
