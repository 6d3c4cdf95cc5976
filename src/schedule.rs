//! Resolution of a sunrise request into concrete instants and a step plan.
//!
//! A request names a profile and how it is anchored to the clock: starting
//! right away, starting at a wall-clock time, or completing at one. A clock
//! time that has already passed today always means the same time tomorrow.
//! Each phase is divided into steps roughly two seconds apart, with a floor of
//! ten steps so even very short phases ramp smoothly.

use chrono::{DateTime, Duration as ChronoDuration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::constants::{MIN_STEPS_PER_PHASE, STEP_CADENCE_SECS};
use crate::error::SolError;
use crate::profiles::{ABLATION_SEQUENCE, Phase, ProfileCatalog, SunriseProfile};
use crate::time_source::until;

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})$").expect("clock time pattern compiles")
});

/// How a sunrise is placed on the clock.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    /// Begin immediately.
    StartNow,
    /// Begin at the next occurrence of `HH:MM`.
    StartAt(String),
    /// Finish at the next occurrence of `HH:MM`.
    CompleteAt(String),
}

impl Anchor {
    pub fn describe(&self) -> String {
        match self {
            Anchor::StartNow => "starting now".to_string(),
            Anchor::StartAt(time) => format!("starting at {time}"),
            Anchor::CompleteAt(time) => format!("completing at {time}"),
        }
    }
}

/// Everything needed to schedule one sunrise.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    /// Bulb address, `host` or `host:port`.
    pub address: String,
    pub profile: String,
    pub anchor: Anchor,
    /// Hours after completion to switch the bulb off again, 0 disables.
    pub auto_off_hours: f64,
    /// Replace the final phase's end temperature.
    pub end_temperature: Option<u16>,
}

impl ScheduleRequest {
    pub fn new(address: impl Into<String>, profile: impl Into<String>, anchor: Anchor) -> Self {
        Self {
            address: address.into(),
            profile: profile.into(),
            anchor,
            auto_off_hours: 0.0,
            end_temperature: None,
        }
    }

    pub fn with_auto_off(mut self, hours: f64) -> Self {
        self.auto_off_hours = hours;
        self
    }

    pub fn with_end_temperature(mut self, kelvin: Option<u16>) -> Self {
        self.end_temperature = kelvin;
        self
    }
}

/// One phase of a resolved schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct PhasePlan {
    pub phase: Phase,
    pub steps: u32,
    pub step_delay: Duration,
}

impl PhasePlan {
    pub fn duration(&self) -> Duration {
        self.step_delay * self.steps
    }
}

/// A request pinned to concrete instants.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchedule {
    pub profile: SunriseProfile,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub phases: Vec<PhasePlan>,
}

impl ResolvedSchedule {
    /// Number of paced device steps across all phases.
    pub fn total_steps(&self) -> u32 {
        self.phases.iter().map(|plan| plan.steps).sum()
    }

    /// Time left before the sunrise begins, zero once it has.
    pub fn wait_from(&self, now: DateTime<Local>) -> Duration {
        until(now, self.start)
    }
}

/// Parse `HH:MM` (single-digit hours accepted).
pub fn parse_clock_time(input: &str) -> Result<NaiveTime, SolError> {
    let invalid = || SolError::InvalidTimeFormat(input.to_string());
    let captures = CLOCK_TIME.captures(input.trim()).ok_or_else(invalid)?;
    let hour: u32 = captures[1].parse().map_err(|_| invalid())?;
    let minute: u32 = captures[2].parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Resolve a request against the catalog at `now`.
pub fn resolve(
    request: &ScheduleRequest,
    catalog: &ProfileCatalog,
    now: DateTime<Local>,
) -> Result<ResolvedSchedule, SolError> {
    let mut profile = catalog.lookup(&request.profile)?.clone();
    if let Some(kelvin) = request.end_temperature {
        profile = profile.with_end_temperature(kelvin)?;
    }
    resolve_profile(profile, &request.anchor, now)
}

/// Resolve an already selected profile.
pub fn resolve_profile(
    profile: SunriseProfile,
    anchor: &Anchor,
    now: DateTime<Local>,
) -> Result<ResolvedSchedule, SolError> {
    let duration = profile.duration();

    let (start, end) = match anchor {
        Anchor::StartNow => (now, now + duration),
        Anchor::StartAt(time) => {
            let start = next_occurrence(parse_clock_time(time)?, now)?;
            (start, start + duration)
        }
        Anchor::CompleteAt(time) => {
            let end = next_occurrence(parse_clock_time(time)?, now)?;
            (end - duration, end)
        }
    };

    let phases = plan_phases(&profile);

    Ok(ResolvedSchedule {
        profile,
        start,
        end,
        phases,
    })
}

/// Split each phase of `profile` into paced steps.
pub fn plan_phases(profile: &SunriseProfile) -> Vec<PhasePlan> {
    let total_secs = f64::from(profile.duration_minutes) * 60.0;
    profile
        .phases
        .iter()
        .map(|phase| {
            let phase_secs = total_secs * phase.share;
            // Nudge before flooring so 719.9999 seconds still counts as 720
            let cadence_steps = ((phase_secs / STEP_CADENCE_SECS) + 1e-9).floor() as u32;
            let steps = cadence_steps.max(MIN_STEPS_PER_PHASE);
            PhasePlan {
                phase: phase.clone(),
                steps,
                step_delay: Duration::from_secs_f64(phase_secs / f64::from(steps)),
            }
        })
        .collect()
}

/// The next instant strictly after `now` whose local wall-clock time is `time`.
pub fn next_occurrence<Tz: TimeZone>(
    time: NaiveTime,
    now: DateTime<Tz>,
) -> Result<DateTime<Tz>, SolError> {
    let zone = now.timezone();
    let today = local_instant(&zone, now.date_naive(), time)?;
    if today > now {
        return Ok(today);
    }
    let tomorrow = now
        .date_naive()
        .succ_opt()
        .ok_or_else(|| SolError::InvalidTimeFormat(time.format("%H:%M").to_string()))?;
    local_instant(&zone, tomorrow, time)
}

// Local wall-clock time on a date. Ambiguous times (DST fall-back) take the
// earlier instant, nonexistent ones (spring-forward gap) move one hour later.
fn local_instant<Tz: TimeZone>(
    zone: &Tz,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<DateTime<Tz>, SolError> {
    let naive = date.and_time(time);
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(instant) => Ok(instant),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => zone
            .from_local_datetime(&(naive + ChronoDuration::hours(1)))
            .earliest()
            .ok_or_else(|| SolError::InvalidTimeFormat(time.format("%H:%M").to_string())),
    }
}

/// One day of the three-day ablation study.
#[derive(Debug, Clone, PartialEq)]
pub struct AblationDay {
    pub day: u32,
    pub date: NaiveDate,
    pub profile: SunriseProfile,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

/// Three consecutive mornings, each starting at `start_time` with the next
/// ablation profile.
pub fn ablation_plan(
    catalog: &ProfileCatalog,
    start_time: &str,
    now: DateTime<Local>,
) -> Result<Vec<AblationDay>, SolError> {
    let time = parse_clock_time(start_time)?;
    let first = next_occurrence(time, now)?;

    ABLATION_SEQUENCE
        .iter()
        .enumerate()
        .map(|(offset, name)| {
            let profile = catalog.lookup(name)?.clone();
            let date = first.date_naive() + ChronoDuration::days(offset as i64);
            let start = local_instant(&Local, date, time)?;
            let end = start + profile.duration();
            Ok(AblationDay {
                day: offset as u32 + 1,
                date,
                profile,
                start,
                end,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Offset, Timelike};
    use chrono_tz::{Europe::Berlin, Tz};
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 15, hour, minute, 0).unwrap()
    }

    fn berlin(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
        Berlin
            .with_ymd_and_hms(2026, month, day, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_start_inside_spring_forward_gap_moves_an_hour_later() {
        // 02:00 jumps straight to 03:00 in Berlin on 2026-03-29
        let now = berlin(3, 28, 22, 0);
        let start = next_occurrence(NaiveTime::from_hms_opt(2, 30, 0).unwrap(), now).unwrap();
        assert_eq!(start, berlin(3, 29, 3, 30));
        assert_eq!(start.offset().fix().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_repeated_hour_at_fall_back_takes_first_pass() {
        // 02:00-03:00 happens twice in Berlin on 2026-10-25
        let now = berlin(10, 24, 22, 0);
        let start = next_occurrence(NaiveTime::from_hms_opt(2, 30, 0).unwrap(), now).unwrap();
        assert_eq!(
            start,
            Berlin.with_ymd_and_hms(2026, 10, 25, 2, 30, 0).earliest().unwrap()
        );
        assert_eq!(start.offset().fix().local_minus_utc(), 2 * 3600);
        assert_eq!(start.with_timezone(&chrono::Utc).hour(), 0);
        assert_eq!(start.with_timezone(&chrono::Utc).minute(), 30);
    }

    fn request(anchor: Anchor, profile: &str) -> ScheduleRequest {
        ScheduleRequest::new("192.168.1.77", profile, anchor)
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(
            parse_clock_time("06:30").unwrap(),
            NaiveTime::from_hms_opt(6, 30, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time("6:05").unwrap(),
            NaiveTime::from_hms_opt(6, 5, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time("23:59").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_clock_time_rejects_garbage() {
        for input in ["", "6", "6:5", "24:00", "12:60", "ab:cd", "06:30:00", "-1:30", "6.30"] {
            assert_eq!(
                parse_clock_time(input),
                Err(SolError::InvalidTimeFormat(input.to_string())),
                "{input}"
            );
        }
    }

    #[test]
    fn test_start_at_in_the_past_rolls_to_tomorrow() {
        let catalog = ProfileCatalog::builtin();
        let now = at(7, 0);
        let schedule = resolve(
            &request(Anchor::StartAt("06:30".into()), "standard"),
            &catalog,
            now,
        )
        .unwrap();

        assert_eq!(schedule.start.day(), 16);
        assert_eq!((schedule.start.hour(), schedule.start.minute()), (6, 30));
        assert_eq!(schedule.end - schedule.start, ChronoDuration::minutes(30));
    }

    #[test]
    fn test_start_at_later_today() {
        let catalog = ProfileCatalog::builtin();
        let schedule = resolve(
            &request(Anchor::StartAt("06:30".into()), "gentle"),
            &catalog,
            at(5, 0),
        )
        .unwrap();
        assert_eq!(schedule.start, at(6, 30));
        assert_eq!(schedule.end, at(7, 15));
        assert_eq!(schedule.wait_from(at(5, 0)), Duration::from_secs(90 * 60));
    }

    #[test]
    fn test_start_at_exactly_now_rolls_forward() {
        let catalog = ProfileCatalog::builtin();
        let schedule = resolve(
            &request(Anchor::StartAt("06:30".into()), "standard"),
            &catalog,
            at(6, 30),
        )
        .unwrap();
        assert_eq!(schedule.start.day(), 16);
    }

    #[test]
    fn test_complete_at_subtracts_duration() {
        let catalog = ProfileCatalog::builtin();
        let schedule = resolve(
            &request(Anchor::CompleteAt("07:00".into()), "standard"),
            &catalog,
            at(1, 0),
        )
        .unwrap();
        assert_eq!(schedule.start, at(6, 30));
        assert_eq!(schedule.end, at(7, 0));
    }

    #[test]
    fn test_complete_at_with_start_already_passed_still_today() {
        // End is later today even though the computed start has passed
        let catalog = ProfileCatalog::builtin();
        let schedule = resolve(
            &request(Anchor::CompleteAt("07:00".into()), "standard"),
            &catalog,
            at(6, 45),
        )
        .unwrap();
        assert_eq!(schedule.end, at(7, 0));
        assert_eq!(schedule.wait_from(at(6, 45)), Duration::ZERO);
    }

    #[test]
    fn test_start_now() {
        let catalog = ProfileCatalog::builtin();
        let now = at(6, 12);
        let schedule = resolve(&request(Anchor::StartNow, "quick"), &catalog, now).unwrap();
        assert_eq!(schedule.start, now);
        assert_eq!(schedule.end, now + ChronoDuration::minutes(20));
    }

    #[test]
    fn test_unknown_profile() {
        let catalog = ProfileCatalog::builtin();
        let err = resolve(&request(Anchor::StartNow, "nap"), &catalog, at(6, 0)).unwrap_err();
        assert!(matches!(err, SolError::UnknownProfile { .. }));
    }

    #[test]
    fn test_invalid_time_surfaces_from_resolve() {
        let catalog = ProfileCatalog::builtin();
        let err = resolve(
            &request(Anchor::CompleteAt("7h".into()), "standard"),
            &catalog,
            at(6, 0),
        )
        .unwrap_err();
        assert_eq!(err, SolError::InvalidTimeFormat("7h".into()));
    }

    #[test]
    fn test_standard_step_plan() {
        let catalog = ProfileCatalog::builtin();
        let schedule = resolve(&request(Anchor::StartNow, "standard"), &catalog, at(6, 0)).unwrap();
        let steps: Vec<u32> = schedule.phases.iter().map(|p| p.steps).collect();
        assert_eq!(steps, vec![360, 315, 225]);
        assert_eq!(
            schedule.total_steps(),
            crate::constants::test_constants::TEST_STANDARD_TOTAL_STEPS
        );
        for plan in &schedule.phases {
            assert!((plan.step_delay.as_secs_f64() - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_short_phase_gets_minimum_steps() {
        let profile = SunriseProfile::new(
            "blink",
            "Blink",
            "",
            1,
            vec![
                Phase::new(0.25, (1, 50), (2500, 3000)),
                Phase::new(0.75, (50, 100), (3000, 4000)),
            ],
        );
        let plans = plan_phases(&profile);
        // 15s and 45s phases: 7 and 22 cadence steps, floored at 10
        assert_eq!(plans[0].steps, 10);
        assert!((plans[0].step_delay.as_secs_f64() - 1.5).abs() < 1e-9);
        assert_eq!(plans[1].steps, 22);
    }

    #[test]
    fn test_end_temperature_override_applies() {
        let catalog = ProfileCatalog::builtin();
        let schedule = resolve(
            &request(Anchor::StartNow, "standard").with_end_temperature(Some(6000)),
            &catalog,
            at(6, 0),
        )
        .unwrap();
        assert_eq!(schedule.profile.final_values(), Some((100, 6000)));
        assert_eq!(schedule.phases[2].phase.end_temperature, 6000);
    }

    #[test]
    fn test_ablation_plan_runs_three_consecutive_days() {
        let catalog = ProfileCatalog::builtin();
        let days = ablation_plan(&catalog, "06:30", at(5, 0)).unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].start, at(6, 30));
        assert_eq!(days[1].date.day(), 16);
        assert_eq!(days[2].date.day(), 17);
        assert_eq!(days[2].profile.name, "ablation_day3");
        assert_eq!(days[2].end - days[2].start, ChronoDuration::minutes(40));
    }

    proptest! {
        #[test]
        fn prop_complete_at_ends_exactly_at_target(hour in 0u32..24, minute in 0u32..60, now_minute in 0u32..(24 * 60)) {
            let catalog = ProfileCatalog::builtin();
            let now = at(0, 0) + ChronoDuration::minutes(i64::from(now_minute));
            let target = format!("{hour:02}:{minute:02}");
            let schedule = resolve(
                &request(Anchor::CompleteAt(target), "standard"),
                &catalog,
                now,
            ).unwrap();

            prop_assert!(schedule.end > now);
            prop_assert!(schedule.end - now <= ChronoDuration::days(1));
            prop_assert_eq!((schedule.end.hour(), schedule.end.minute()), (hour, minute));
            prop_assert_eq!(schedule.end - schedule.start, ChronoDuration::minutes(30));
        }

        #[test]
        fn prop_every_phase_has_minimum_steps(minutes in 1u32..=180) {
            let mut profile = ProfileCatalog::builtin().lookup("quick").unwrap().clone();
            profile.duration_minutes = minutes;
            for plan in plan_phases(&profile) {
                prop_assert!(plan.steps >= MIN_STEPS_PER_PHASE);
                prop_assert!(plan.step_delay.as_secs_f64() <= STEP_CADENCE_SECS * 1.5 + 1e-9
                    || plan.steps == MIN_STEPS_PER_PHASE);
            }
        }
    }
}
