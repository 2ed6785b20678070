//! Velocity profile generation.
//!
//! Computes the commanded speed for the next tick from the current speed,
//! elapsed time and motion mode. Acceleration is reduced inside the
//! soft-start window to limit mechanical shock at motion onset; moves
//! trigger deceleration from the stopping distance at current speed so the
//! target is reached as speed decays to the start floor.

use crate::config::MotionCfg;

#[derive(Debug)]
pub struct VelocityProfile {
    cfg: MotionCfg,
}

impl VelocityProfile {
    pub fn new(cfg: MotionCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &MotionCfg {
        &self.cfg
    }

    #[inline]
    fn accel_now(&self, in_soft_window: bool) -> f32 {
        if in_soft_window {
            self.cfg.soft_accel_sps2
        } else {
            self.cfg.accel_sps2
        }
    }

    /// Travel required to decelerate from `speed` to the start floor.
    #[inline]
    pub fn stopping_distance_steps(&self, speed: f32) -> f32 {
        (speed * speed) / (2.0 * self.cfg.decel_sps2)
    }

    /// Idle: decay toward zero at the deceleration rate.
    pub fn idle(&self, speed: f32, dt: f32) -> f32 {
        (speed - self.cfg.decel_sps2 * dt).max(0.0)
    }

    /// Jog: ramp toward `limit`, soft-start aware. Never decelerates on
    /// its own; demand drop routes through the Idle decay path instead.
    pub fn jog(&self, speed: f32, limit: f32, dt: f32, in_soft_window: bool) -> f32 {
        let speed = speed.max(self.cfg.start_floor_sps);
        (speed + self.accel_now(in_soft_window) * dt).min(limit)
    }

    /// Move: decelerate once the remaining distance is inside the stopping
    /// distance (plus a one-step margin), even mid-acceleration; otherwise
    /// accelerate toward `limit`.
    pub fn move_toward(
        &self,
        speed: f32,
        limit: f32,
        remaining_steps: u64,
        dt: f32,
        in_soft_window: bool,
    ) -> f32 {
        let speed = speed.max(self.cfg.start_floor_sps);
        if remaining_steps as f32 <= self.stopping_distance_steps(speed) + 1.0 {
            (speed - self.cfg.decel_sps2 * dt).max(self.cfg.start_floor_sps)
        } else {
            (speed + self.accel_now(in_soft_window) * dt).min(limit)
        }
    }

    /// Reversing: pure deceleration, ignoring stopping distance. Returns
    /// the new speed and whether the flip point (start floor) was reached.
    pub fn reversing(&self, speed: f32, dt: f32) -> (f32, bool) {
        let next = speed - self.cfg.decel_sps2 * dt;
        if next <= self.cfg.start_floor_sps {
            (self.cfg.start_floor_sps, true)
        } else {
            (next, false)
        }
    }
}
