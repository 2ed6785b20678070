//! Runtime configuration for the controller, in step units.
//!
//! `winch_config` speaks rev/s to match the drive documentation; these
//! structs are the converted steps/s form the control loop works in.

use std::time::Duration;

/// Speed limits and ramp rates, steps and steps/s.
#[derive(Debug, Clone)]
pub struct MotionCfg {
    /// Full steps per output revolution, including drive microstepping.
    pub steps_per_rev: u32,
    /// Jog speed ceiling (steps/s).
    pub jog_max_sps: f32,
    /// Move speed ceiling (steps/s).
    pub move_max_sps: f32,
    /// Steady acceleration (steps/s²).
    pub accel_sps2: f32,
    /// Deceleration (steps/s²); also the Idle decay rate.
    pub decel_sps2: f32,
    /// Reduced acceleration inside the soft-start window (steps/s²).
    pub soft_accel_sps2: f32,
    /// Soft-start window from motion onset.
    pub soft_start: Duration,
    /// Speed floor a fresh Jog/Move starts from (steps/s).
    pub start_floor_sps: f32,
    /// Below this speed no pulses are emitted (steps/s).
    pub min_speed_sps: f32,
    /// Accepted range for VJ/VM speed-limit commands (rev/s).
    pub cmd_speed_min_rps: f32,
    pub cmd_speed_max_rps: f32,
}

impl Default for MotionCfg {
    fn default() -> Self {
        Self::from_file(&winch_config::Motion::default())
    }
}

impl MotionCfg {
    pub fn from_file(m: &winch_config::Motion) -> Self {
        let spr = m.steps_per_rev.max(1) as f32;
        Self {
            steps_per_rev: m.steps_per_rev,
            jog_max_sps: m.jog_max_rps * spr,
            move_max_sps: m.move_max_rps * spr,
            accel_sps2: m.accel_rps2 * spr,
            decel_sps2: m.decel_rps2 * spr,
            soft_accel_sps2: m.soft_accel_rps2 * spr,
            soft_start: Duration::from_millis(m.soft_start_ms),
            start_floor_sps: m.start_floor_rps * spr,
            min_speed_sps: m.min_speed_rps * spr,
            cmd_speed_min_rps: m.cmd_speed_min_rps,
            cmd_speed_max_rps: m.cmd_speed_max_rps,
        }
    }

    /// Convert a commanded rev/s value to steps/s.
    #[inline]
    pub fn sps(&self, rps: f32) -> f32 {
        rps * self.steps_per_rev.max(1) as f32
    }

    /// Convert steps/s back to rev/s for the status line.
    #[inline]
    pub fn rps(&self, sps: f32) -> f32 {
        sps / self.steps_per_rev.max(1) as f32
    }
}

/// Pulse scheduling limits.
#[derive(Debug, Clone)]
pub struct StepperCfg {
    /// Upper bound on STEP pulses emitted in a single control tick.
    pub max_pulses_per_tick: u8,
    /// Minimum spacing between STEP edges, from the drive datasheet.
    pub min_interval: Duration,
    /// STEP high time.
    pub pulse_width: Duration,
}

impl Default for StepperCfg {
    fn default() -> Self {
        Self::from_file(&winch_config::Stepper::default())
    }
}

impl StepperCfg {
    pub fn from_file(s: &winch_config::Stepper) -> Self {
        Self {
            max_pulses_per_tick: s.max_pulses_per_tick,
            min_interval: Duration::from_micros(s.min_interval_us),
            pulse_width: Duration::from_micros(s.pulse_width_us),
        }
    }
}

/// Debounce and press-classification timing.
#[derive(Debug, Clone, Copy)]
pub struct ButtonCfg {
    pub debounce: Duration,
    pub long_press: Duration,
}

impl Default for ButtonCfg {
    fn default() -> Self {
        Self::from_file(&winch_config::Buttons::default())
    }
}

impl ButtonCfg {
    pub fn from_file(b: &winch_config::Buttons) -> Self {
        Self {
            debounce: Duration::from_millis(b.debounce_ms),
            long_press: Duration::from_millis(b.long_press_ms),
        }
    }
}

/// Enable-settle and brake-release sequencing.
#[derive(Debug, Clone, Copy)]
pub struct SafetyCfg {
    /// Delay after ENABLE assertion before any motion logic runs.
    pub enable_settle: Duration,
    /// Delay between jog demand onset from standstill and the first pulse.
    pub brake_release: Duration,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self::from_file(&winch_config::Safety::default())
    }
}

impl SafetyCfg {
    pub fn from_file(s: &winch_config::Safety) -> Self {
        Self {
            enable_settle: Duration::from_millis(s.enable_settle_ms),
            brake_release: Duration::from_millis(s.brake_release_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MotionCfg;

    #[test]
    fn rev_units_convert_through_steps_per_rev() {
        let cfg = MotionCfg::default();
        assert_eq!(cfg.steps_per_rev, 4000);
        assert!((cfg.jog_max_sps - 40_000.0).abs() < f32::EPSILON);
        assert!((cfg.move_max_sps - 30_000.0).abs() < f32::EPSILON);
        assert!((cfg.sps(2.5) - 10_000.0).abs() < f32::EPSILON);
        assert!((cfg.rps(10_000.0) - 2.5).abs() < 1e-6);
    }
}
