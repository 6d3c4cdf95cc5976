//! Optional configuration file for sol.
//!
//! Settings are read from `sol.toml` in `$XDG_CONFIG_HOME/sol/` (usually
//! `~/.config/sol/`), or from the directory given with `--config`. The file is
//! never created or rewritten by sol; when it is missing every setting takes
//! its default.
//!
//! ```toml
//! bulb_ip = "192.168.1.77"   # Bulb address, host or host:port
//! profile = "standard"       # Default sunrise profile
//! wake_time = "06:30"        # Default time for `at`, `up` and `ablation` (HH:MM)
//! auto_off_hours = 0.0       # Switch off again N hours after completion (0-24, 0 = never)
//! device_timeout_ms = 2000   # Socket timeout per bulb request (100-30000)
//! step_failure_budget = 30   # Consecutive failed steps before giving up (1-1000)
//! ```
//!
//! Values given on the command line always win over the file.

pub mod loading;
pub mod validation;

use serde::Deserialize;
use std::time::Duration;

use crate::constants::*;

pub use loading::{get_config_path, load, load_from_path};

/// Contents of `sol.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub bulb_ip: Option<String>,
    pub profile: Option<String>,
    pub wake_time: Option<String>,
    pub auto_off_hours: Option<f64>,
    pub device_timeout_ms: Option<u64>,
    pub step_failure_budget: Option<u32>,
}

impl Config {
    pub fn bulb_ip(&self) -> &str {
        self.bulb_ip.as_deref().unwrap_or(DEFAULT_BULB_IP)
    }

    pub fn profile(&self) -> &str {
        self.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    pub fn wake_time(&self) -> &str {
        self.wake_time.as_deref().unwrap_or(DEFAULT_WAKE_TIME)
    }

    pub fn auto_off_hours(&self) -> f64 {
        self.auto_off_hours.unwrap_or(DEFAULT_AUTO_OFF_HOURS)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_millis(self.device_timeout_ms.unwrap_or(DEFAULT_DEVICE_TIMEOUT_MS))
    }

    pub fn step_failure_budget(&self) -> u32 {
        self.step_failure_budget
            .unwrap_or(DEFAULT_STEP_FAILURE_BUDGET)
    }

    /// Print the effective settings.
    pub fn log_config(&self, source: Option<&std::path::Path>) {
        match source {
            Some(path) => log_block_start!("Loaded configuration from {}", loading::private_path(path)),
            None => log_block_start!("No configuration file, using defaults"),
        }
        log_indented!("Bulb: {}", self.bulb_ip());
        log_indented!("Profile: {}", self.profile());
        log_indented!("Wake time: {}", self.wake_time());
        let auto_off = self.auto_off_hours();
        if auto_off > 0.0 {
            log_indented!("Auto-off: {auto_off}h after completion");
        } else {
            log_indented!("Auto-off: disabled");
        }
        log_indented!("Device timeout: {}ms", self.device_timeout().as_millis());
        log_indented!("Step failure budget: {}", self.step_failure_budget());
    }
}
