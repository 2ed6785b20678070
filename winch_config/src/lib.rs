#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the winch controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Speeds and ramps are expressed in rev/s and rev/s² here, matching the
//!   drive documentation; `winch_core` converts to steps/s using
//!   `motion.steps_per_rev`.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Pins {
    pub step: u8,
    pub dir: u8,
    pub enable: u8,
    pub home_button: u8,
    pub well_button: u8,
    pub jog_left_button: u8,
    pub jog_right_button: u8,
    pub estop: u8,
    /// Invert the DIR level sense (wiring-dependent).
    #[serde(default)]
    pub dir_inverted: bool,
    /// Drive ENABLE input is active-low on many drives.
    #[serde(default = "default_true")]
    pub enable_active_low: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Motion {
    /// Full steps per output revolution, including drive microstepping.
    pub steps_per_rev: u32,
    /// Jog speed ceiling (rev/s).
    pub jog_max_rps: f32,
    /// Move speed ceiling (rev/s).
    pub move_max_rps: f32,
    /// Steady acceleration (rev/s²).
    pub accel_rps2: f32,
    /// Deceleration (rev/s²); usually higher than accel for hard stops.
    pub decel_rps2: f32,
    /// Reduced acceleration used inside the soft-start window (rev/s²).
    pub soft_accel_rps2: f32,
    /// Soft-start window measured from motion onset (ms).
    pub soft_start_ms: u64,
    /// Speed floor a fresh Jog/Move starts from (rev/s).
    pub start_floor_rps: f32,
    /// Below this speed no pulses are emitted (rev/s).
    pub min_speed_rps: f32,
    /// Accepted range for VJ/VM speed-limit commands (rev/s).
    pub cmd_speed_min_rps: f32,
    pub cmd_speed_max_rps: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            steps_per_rev: 4000,
            jog_max_rps: 10.0,
            move_max_rps: 7.5,
            accel_rps2: 1.5,
            decel_rps2: 8.5,
            soft_accel_rps2: 0.5,
            soft_start_ms: 350,
            start_floor_rps: 0.1,
            min_speed_rps: 0.02,
            cmd_speed_min_rps: 0.1,
            cmd_speed_max_rps: 20.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Stepper {
    /// Upper bound on STEP pulses emitted in a single control tick.
    pub max_pulses_per_tick: u8,
    /// Minimum spacing between STEP edges (µs), from the drive datasheet.
    pub min_interval_us: u64,
    /// STEP high time (µs).
    pub pulse_width_us: u64,
}

impl Default for Stepper {
    fn default() -> Self {
        Self {
            max_pulses_per_tick: 4,
            min_interval_us: 20,
            pulse_width_us: 3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Buttons {
    /// A raw level change must persist this long to become stable (ms).
    pub debounce_ms: u64,
    /// Hold at least this long for a release to classify as long-press (ms).
    pub long_press_ms: u64,
}

impl Default for Buttons {
    fn default() -> Self {
        Self {
            debounce_ms: 25,
            long_press_ms: 1200,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Safety {
    /// Delay after ENABLE assertion before any motion logic runs (ms).
    pub enable_settle_ms: u64,
    /// Delay between jog demand onset from standstill and the first pulse (ms).
    pub brake_release_ms: u64,
}

impl Default for Safety {
    fn default() -> Self {
        Self {
            enable_settle_ms: 80,
            brake_release_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EstopCfg {
    /// Normally-closed loop: low level means tripped when true.
    pub active_low: bool,
}

impl Default for EstopCfg {
    fn default() -> Self {
        Self { active_low: true }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Runner {
    /// Control tick rate (Hz).
    pub tick_hz: u32,
    /// Unsolicited status line interval (ms); 0 disables.
    pub status_ms: u64,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            tick_hz: 1000,
            status_ms: 150,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub motion: Motion,
    #[serde(default)]
    pub stepper: Stepper,
    #[serde(default)]
    pub buttons: Buttons,
    #[serde(default)]
    pub safety: Safety,
    #[serde(default)]
    pub estop: EstopCfg,
    #[serde(default)]
    pub runner: Runner,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Motion
        if self.motion.steps_per_rev == 0 {
            eyre::bail!("motion.steps_per_rev must be > 0");
        }
        if !(self.motion.jog_max_rps.is_finite() && self.motion.jog_max_rps > 0.0) {
            eyre::bail!("motion.jog_max_rps must be > 0");
        }
        if !(self.motion.move_max_rps.is_finite() && self.motion.move_max_rps > 0.0) {
            eyre::bail!("motion.move_max_rps must be > 0");
        }
        if !(self.motion.accel_rps2.is_finite() && self.motion.accel_rps2 > 0.0) {
            eyre::bail!("motion.accel_rps2 must be > 0");
        }
        if !(self.motion.decel_rps2.is_finite() && self.motion.decel_rps2 > 0.0) {
            eyre::bail!("motion.decel_rps2 must be > 0");
        }
        if !(self.motion.soft_accel_rps2.is_finite() && self.motion.soft_accel_rps2 > 0.0) {
            eyre::bail!("motion.soft_accel_rps2 must be > 0");
        }
        if self.motion.soft_accel_rps2 > self.motion.accel_rps2 {
            eyre::bail!("motion.soft_accel_rps2 must not exceed motion.accel_rps2");
        }
        if !(self.motion.start_floor_rps.is_finite() && self.motion.start_floor_rps > 0.0) {
            eyre::bail!("motion.start_floor_rps must be > 0");
        }
        if self.motion.min_speed_rps.is_sign_negative() || !self.motion.min_speed_rps.is_finite() {
            eyre::bail!("motion.min_speed_rps must be >= 0");
        }
        if self.motion.min_speed_rps > self.motion.start_floor_rps {
            eyre::bail!("motion.min_speed_rps must not exceed motion.start_floor_rps");
        }
        if self.motion.cmd_speed_min_rps <= 0.0
            || self.motion.cmd_speed_max_rps < self.motion.cmd_speed_min_rps
        {
            eyre::bail!("motion.cmd_speed range must satisfy 0 < min <= max");
        }
        // A commanded ceiling below the start floor would let speed exceed
        // the ceiling during ramp-in.
        if self.motion.cmd_speed_min_rps < self.motion.start_floor_rps {
            eyre::bail!("motion.cmd_speed_min_rps must be >= motion.start_floor_rps");
        }

        // Stepper
        if self.stepper.max_pulses_per_tick == 0 {
            eyre::bail!("stepper.max_pulses_per_tick must be >= 1");
        }
        if self.stepper.min_interval_us == 0 {
            eyre::bail!("stepper.min_interval_us must be >= 1");
        }
        if self.stepper.pulse_width_us == 0 {
            eyre::bail!("stepper.pulse_width_us must be >= 1");
        }
        if self.stepper.pulse_width_us >= self.stepper.min_interval_us {
            eyre::bail!("stepper.pulse_width_us must be below stepper.min_interval_us");
        }

        // Buttons
        if self.buttons.debounce_ms == 0 {
            eyre::bail!("buttons.debounce_ms must be >= 1");
        }
        if self.buttons.long_press_ms <= self.buttons.debounce_ms {
            eyre::bail!("buttons.long_press_ms must exceed buttons.debounce_ms");
        }

        // Runner
        if self.runner.tick_hz == 0 {
            eyre::bail!("runner.tick_hz must be > 0");
        }
        if self.runner.tick_hz > 10_000 {
            eyre::bail!("runner.tick_hz is unreasonably large (>10kHz)");
        }

        Ok(())
    }
}
