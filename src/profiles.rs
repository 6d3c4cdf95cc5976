//! Named sunrise profiles and the catalog that holds them.
//!
//! A profile is an ordered list of phases that together cover its whole
//! duration. Each phase owns a share of that duration and ramps brightness and
//! color temperature between its start and end values. The catalog is built
//! once at startup, validated, and passed by reference to whoever needs it.

use crate::constants::{
    MAXIMUM_BRIGHTNESS, MAXIMUM_TEMP, MINIMUM_BRIGHTNESS, MINIMUM_TEMP, SHARE_SUM_TOLERANCE,
};
use crate::error::SolError;

/// One segment of a sunrise profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    /// Fraction of the profile duration spent in this phase, in (0, 1].
    pub share: f64,
    pub start_brightness: u8,
    pub end_brightness: u8,
    pub start_temperature: u16,
    pub end_temperature: u16,
    /// Perturb brightness with a gentle sine wave during this phase.
    pub oscillate: bool,
}

impl Phase {
    pub const fn new(
        share: f64,
        brightness: (u8, u8),
        temperature: (u16, u16),
    ) -> Self {
        Self {
            share,
            start_brightness: brightness.0,
            end_brightness: brightness.1,
            start_temperature: temperature.0,
            end_temperature: temperature.1,
            oscillate: false,
        }
    }

    pub const fn oscillating(mut self) -> Self {
        self.oscillate = true;
        self
    }

    /// Lowest and highest temperature this phase may emit.
    pub fn temperature_bounds(&self) -> (u16, u16) {
        (
            self.start_temperature.min(self.end_temperature),
            self.start_temperature.max(self.end_temperature),
        )
    }

    fn validate(&self, profile: &str, index: usize) -> Result<(), SolError> {
        if !(self.share > 0.0 && self.share <= 1.0) {
            return Err(SolError::InvalidProfile(format!(
                "'{profile}' phase {} share {} must be in (0, 1]",
                index + 1,
                self.share
            )));
        }

        for brightness in [self.start_brightness, self.end_brightness] {
            if !(MINIMUM_BRIGHTNESS..=MAXIMUM_BRIGHTNESS).contains(&brightness) {
                return Err(SolError::InvalidProfile(format!(
                    "'{profile}' phase {} brightness {brightness}% must be between {MINIMUM_BRIGHTNESS} and {MAXIMUM_BRIGHTNESS}",
                    index + 1
                )));
            }
        }

        for temperature in [self.start_temperature, self.end_temperature] {
            if !(MINIMUM_TEMP..=MAXIMUM_TEMP).contains(&temperature) {
                return Err(SolError::InvalidProfile(format!(
                    "'{profile}' phase {} temperature {temperature}K must be between {MINIMUM_TEMP} and {MAXIMUM_TEMP}",
                    index + 1
                )));
            }
        }

        Ok(())
    }
}

/// A named, multi-phase sunrise.
#[derive(Debug, Clone, PartialEq)]
pub struct SunriseProfile {
    pub name: String,
    pub label: String,
    pub description: String,
    pub duration_minutes: u32,
    pub phases: Vec<Phase>,
}

impl SunriseProfile {
    pub fn new(
        name: &str,
        label: &str,
        description: &str,
        duration_minutes: u32,
        phases: Vec<Phase>,
    ) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            duration_minutes,
            phases,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Brightness and temperature the profile lands on when it completes.
    pub fn final_values(&self) -> Option<(u8, u16)> {
        self.phases
            .last()
            .map(|phase| (phase.end_brightness, phase.end_temperature))
    }

    /// Copy of this profile whose final phase ends at `kelvin` instead.
    ///
    /// The copy is validated again, so an override that leaves the supported
    /// range is rejected rather than clamped.
    pub fn with_end_temperature(&self, kelvin: u16) -> Result<Self, SolError> {
        let mut profile = self.clone();
        if let Some(last) = profile.phases.last_mut() {
            last.end_temperature = kelvin;
        }
        profile.validate()?;
        Ok(profile)
    }

    /// Check the profile's structural invariants.
    ///
    /// Shares must sum to one, every value must be in range, and each phase
    /// must start where the previous one ended so a run never jumps.
    pub fn validate(&self) -> Result<(), SolError> {
        if self.duration_minutes == 0 {
            return Err(SolError::InvalidProfile(format!(
                "'{}' must last at least one minute",
                self.name
            )));
        }

        if self.phases.is_empty() {
            return Err(SolError::InvalidProfile(format!(
                "'{}' has no phases",
                self.name
            )));
        }

        for (index, phase) in self.phases.iter().enumerate() {
            phase.validate(&self.name, index)?;
        }

        let share_sum: f64 = self.phases.iter().map(|p| p.share).sum();
        if (share_sum - 1.0).abs() > SHARE_SUM_TOLERANCE {
            return Err(SolError::InvalidProfile(format!(
                "'{}' phase shares sum to {share_sum}, expected 1.0",
                self.name
            )));
        }

        for (index, pair) in self.phases.windows(2).enumerate() {
            let (previous, next) = (&pair[0], &pair[1]);
            if previous.end_brightness != next.start_brightness
                || previous.end_temperature != next.start_temperature
            {
                return Err(SolError::InvalidProfile(format!(
                    "'{}' phase {} ends at {}%/{}K but phase {} starts at {}%/{}K",
                    self.name,
                    index + 1,
                    previous.end_brightness,
                    previous.end_temperature,
                    index + 2,
                    next.start_brightness,
                    next.start_temperature
                )));
            }
        }

        Ok(())
    }
}

/// Immutable, ordered collection of validated profiles.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: Vec<SunriseProfile>,
}

impl ProfileCatalog {
    /// Build a catalog, validating every profile and rejecting duplicate names.
    pub fn new(profiles: Vec<SunriseProfile>) -> Result<Self, SolError> {
        for (index, profile) in profiles.iter().enumerate() {
            profile.validate()?;
            if profiles[..index].iter().any(|p| p.name == profile.name) {
                return Err(SolError::InvalidProfile(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }
        Ok(Self { profiles })
    }

    /// The six profiles sol ships with.
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&SunriseProfile, SolError> {
        self.profiles
            .iter()
            .find(|profile| profile.name == name)
            .ok_or_else(|| SolError::UnknownProfile {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// All profiles, in the order they were defined.
    pub fn list_all(&self) -> &[SunriseProfile] {
        &self.profiles
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }
}

fn builtin_profiles() -> Vec<SunriseProfile> {
    vec![
        SunriseProfile::new(
            "standard",
            "Standard (30 min)",
            "Research-backed 30-min sunrise. Good for most people.",
            30,
            vec![
                Phase::new(0.40, (1, 20), (2500, 2700)),
                Phase::new(0.35, (20, 60), (2700, 3200)),
                Phase::new(0.25, (60, 100), (3200, 4000)),
            ],
        ),
        SunriseProfile::new(
            "quick",
            "Quick (20 min)",
            "Faster sunrise for light sleepers or when short on time.",
            20,
            vec![
                Phase::new(0.30, (1, 25), (2500, 2800)),
                Phase::new(0.35, (25, 65), (2800, 3400)),
                Phase::new(0.35, (65, 100), (3400, 4000)),
            ],
        ),
        SunriseProfile::new(
            "gentle",
            "Gentle (45 min)",
            "Extended sunrise for deep sleepers. More gradual transition.",
            45,
            vec![
                Phase::new(0.45, (1, 15), (2500, 2600)),
                Phase::new(0.30, (15, 50), (2600, 3000)),
                Phase::new(0.25, (50, 100), (3000, 4000)),
            ],
        ),
        SunriseProfile::new(
            "ablation_day1",
            "Ablation Day 1: Quick + Cool End",
            "Test: Faster with cooler end temp (more alerting)",
            20,
            vec![
                Phase::new(0.30, (1, 30), (2500, 3000)),
                Phase::new(0.35, (30, 70), (3000, 4000)),
                Phase::new(0.35, (70, 100), (4000, 5000)),
            ],
        ),
        SunriseProfile::new(
            "ablation_day2",
            "Ablation Day 2: Standard + Warm",
            "Test: Standard duration, warmer end temp (gentler)",
            30,
            vec![
                Phase::new(0.40, (1, 20), (2500, 2700)),
                Phase::new(0.35, (20, 60), (2700, 3000)),
                Phase::new(0.25, (60, 100), (3000, 3500)),
            ],
        ),
        SunriseProfile::new(
            "ablation_day3",
            "Ablation Day 3: Long + Oscillating",
            "Test: Longer with gentle brightness oscillation in final phase",
            40,
            vec![
                Phase::new(0.40, (1, 20), (2500, 2700)),
                Phase::new(0.35, (20, 55), (2700, 3200)),
                Phase::new(0.25, (55, 100), (3200, 4000)).oscillating(),
            ],
        ),
    ]
}

/// Profile names of the three-day ablation study, in order.
pub const ABLATION_SEQUENCE: [&str; 3] = ["ablation_day1", "ablation_day2", "ablation_day3"];

/// Map a sunrise length in minutes to the built-in profile of that length.
pub fn profile_for_duration(minutes: u32) -> Option<&'static str> {
    match minutes {
        20 => Some("quick"),
        30 => Some("standard"),
        45 => Some("gentle"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_valid() {
        let profiles = ProfileCatalog::builtin().list_all().to_vec();
        assert!(ProfileCatalog::new(profiles).is_ok());
    }

    #[test]
    fn test_builtin_shares_sum_to_one() {
        for profile in ProfileCatalog::builtin().list_all() {
            let sum: f64 = profile.phases.iter().map(|p| p.share).sum();
            assert!(
                (sum - 1.0).abs() <= SHARE_SUM_TOLERANCE,
                "{} sums to {sum}",
                profile.name
            );
        }
    }

    #[test]
    fn test_list_all_preserves_definition_order() {
        let names = ProfileCatalog::builtin().names();
        assert_eq!(
            names,
            vec![
                "standard",
                "quick",
                "gentle",
                "ablation_day1",
                "ablation_day2",
                "ablation_day3"
            ]
        );
    }

    #[test]
    fn test_lookup_known_profile() {
        let catalog = ProfileCatalog::builtin();
        let quick = catalog.lookup("quick").unwrap();
        assert_eq!(quick.duration_minutes, 20);
        assert_eq!(quick.final_values(), Some((100, 4000)));
    }

    #[test]
    fn test_lookup_unknown_profile_lists_available() {
        let catalog = ProfileCatalog::builtin();
        match catalog.lookup("sunset") {
            Err(SolError::UnknownProfile { name, available }) => {
                assert_eq!(name, "sunset");
                assert_eq!(available.len(), 6);
            }
            other => panic!("expected UnknownProfile, got {other:?}"),
        }
    }

    #[test]
    fn test_only_day3_oscillates() {
        let catalog = ProfileCatalog::builtin();
        for profile in catalog.list_all() {
            let oscillating: Vec<bool> = profile.phases.iter().map(|p| p.oscillate).collect();
            if profile.name == "ablation_day3" {
                assert_eq!(oscillating, vec![false, false, true]);
            } else {
                assert!(oscillating.iter().all(|o| !o), "{}", profile.name);
            }
        }
    }

    #[test]
    fn test_rejects_shares_not_summing_to_one() {
        let profile = SunriseProfile::new(
            "short",
            "Short",
            "",
            10,
            vec![
                Phase::new(0.5, (1, 50), (2500, 3000)),
                Phase::new(0.4, (50, 100), (3000, 4000)),
            ],
        );
        assert!(matches!(
            ProfileCatalog::new(vec![profile]),
            Err(SolError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_rejects_discontinuous_phases() {
        let profile = SunriseProfile::new(
            "jumpy",
            "Jumpy",
            "",
            10,
            vec![
                Phase::new(0.5, (1, 40), (2500, 3000)),
                Phase::new(0.5, (50, 100), (3000, 4000)),
            ],
        );
        let err = ProfileCatalog::new(vec![profile]).unwrap_err();
        assert!(err.to_string().contains("phase 1 ends at 40%"));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let profile = SunriseProfile::new(
            "candle",
            "Candle",
            "",
            10,
            vec![Phase::new(1.0, (1, 100), (1900, 4000))],
        );
        assert!(ProfileCatalog::new(vec![profile]).is_err());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let standard = ProfileCatalog::builtin().lookup("standard").unwrap().clone();
        assert!(ProfileCatalog::new(vec![standard.clone(), standard]).is_err());
    }

    #[test]
    fn test_end_temperature_override() {
        let catalog = ProfileCatalog::builtin();
        let warmer = catalog
            .lookup("standard")
            .unwrap()
            .with_end_temperature(5500)
            .unwrap();
        assert_eq!(warmer.final_values(), Some((100, 5500)));
        assert_eq!(warmer.phases[0], catalog.lookup("standard").unwrap().phases[0]);

        assert!(
            catalog
                .lookup("standard")
                .unwrap()
                .with_end_temperature(9000)
                .is_err()
        );
    }

    #[test]
    fn test_profile_for_duration() {
        assert_eq!(profile_for_duration(20), Some("quick"));
        assert_eq!(profile_for_duration(30), Some("standard"));
        assert_eq!(profile_for_duration(45), Some("gentle"));
        assert_eq!(profile_for_duration(25), None);
    }
}
