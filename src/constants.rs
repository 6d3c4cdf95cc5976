//! Application-wide constants and default values.
//!
//! Defaults apply when neither the config file nor the command line provides a
//! value. Limits bound what validation accepts.

// # Application Defaults

pub const DEFAULT_BULB_IP: &str = "192.168.1.77";
pub const DEFAULT_PROFILE: &str = "standard";
pub const DEFAULT_WAKE_TIME: &str = "06:30";
pub const DEFAULT_AUTO_OFF_HOURS: f64 = 0.0;
pub const DEFAULT_DEVICE_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_STEP_FAILURE_BUDGET: u32 = 30;

// # Validation Limits

pub const MINIMUM_BRIGHTNESS: u8 = 1;
pub const MAXIMUM_BRIGHTNESS: u8 = 100;
pub const MINIMUM_TEMP: u16 = 2500; // Kelvin, warmest setting of common tunable bulbs
pub const MAXIMUM_TEMP: u16 = 6500;
pub const MINIMUM_AUTO_OFF_HOURS: f64 = 0.0;
pub const MAXIMUM_AUTO_OFF_HOURS: f64 = 24.0;
pub const MINIMUM_DEVICE_TIMEOUT_MS: u64 = 100;
pub const MAXIMUM_DEVICE_TIMEOUT_MS: u64 = 30_000;
pub const MINIMUM_STEP_FAILURE_BUDGET: u32 = 1;
pub const MAXIMUM_STEP_FAILURE_BUDGET: u32 = 1000;

// # Step Planning

/// Target spacing between device commands, in seconds.
pub const STEP_CADENCE_SECS: f64 = 2.0;

/// Every phase gets at least this many steps, however short it is.
pub const MIN_STEPS_PER_PHASE: u32 = 10;

/// Tolerance for phase shares summing to one.
pub const SHARE_SUM_TOLERANCE: f64 = 1e-6;

// # Oscillation

pub const OSCILLATION_AMPLITUDE: f64 = 5.0; // brightness percentage points
pub const OSCILLATION_RATE: f64 = 0.5; // radians per step

// # Timing

/// Longest uninterrupted sleep before the cancellation token is checked again.
pub const CANCEL_POLL_INTERVAL_MS: u64 = 250;

/// Pause after forcing the bulb off, before the first sunrise values are applied.
pub const POWER_CYCLE_SETTLE_MS: u64 = 500;

/// Delay before the single connection retry when entering the first phase.
pub const CONNECT_RETRY_DELAY_MS: u64 = 1500;

/// How often the countdown is forwarded while waiting for the start instant.
pub const COUNTDOWN_REPORT_INTERVAL_SECS: u64 = 60;

// # Device Protocol

/// TCP port of the legacy Kasa local protocol.
pub const KASA_PORT: u16 = 9999;

/// Initial key of the Kasa XOR autokey cipher.
pub const KASA_INITIAL_KEY: u8 = 171;

/// Upper bound on a response frame, guards against a garbage length prefix.
pub const KASA_MAX_RESPONSE_BYTES: usize = 64 * 1024;

// # Display

pub const PROGRESS_BAR_WIDTH: usize = 30;

// # Setup Screen

pub const SETUP_DEFAULT_WAKE_TIME: &str = "07:00";
pub const SETUP_WAKE_STEP_MINUTES: i64 = 5;
pub const SETUP_DURATION_OPTIONS: [u32; 3] = [20, 30, 45];
pub const SETUP_DEFAULT_DURATION_INDEX: usize = 1;
pub const SETUP_END_TEMP_OPTIONS: [u16; 6] = [4000, 4500, 5000, 5500, 6000, 6500];
pub const SETUP_DEFAULT_END_TEMP_INDEX: usize = 0;

// # Exit Codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CANCELLED: i32 = 130;
