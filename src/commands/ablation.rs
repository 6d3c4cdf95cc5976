//! `ablation`: print the three-day profile comparison schedule.

use anyhow::Result;

use super::{Session, report_sol_error};
use crate::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::schedule::ablation_plan;

pub fn run_ablation_command(session: &Session, time: Option<&str>) -> Result<i32> {
    let start_time = time.unwrap_or(session.wake_time());
    let days = match ablation_plan(&session.catalog, start_time, session.clock.now()) {
        Ok(days) => days,
        Err(err) => {
            report_sol_error(&err);
            return Ok(EXIT_FAILURE);
        }
    };

    log_version!();
    log_block_start!("3-day ablation test schedule");
    for day in &days {
        log_pipe!();
        log_indented!("Day {} ({}):", day.day, day.date.format("%A, %b %d"));
        log_indented!("  Profile:  {}", day.profile.label);
        log_indented!("  {}", day.profile.description);
        log_indented!(
            "  Sunrise:  {} → {} ({} min)",
            day.start.format("%H:%M"),
            day.end.format("%H:%M"),
            day.profile.duration_minutes
        );
        log_indented!("  Command:  sol at {} -p {}", start_time, day.profile.name);
    }
    log_pipe!();
    log_info!("Rate your wake quality each day (1-10) to compare");
    log_end!();
    Ok(EXIT_SUCCESS)
}
