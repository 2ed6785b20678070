//! Step pulse scheduling and emission.
//!
//! Converts the commanded speed into STEP pulses on a deadline schedule.
//! A tick emits at most `max_pulses_per_tick` pulses; if the schedule is
//! still behind after that, the backlog is dropped by snapping the
//! deadline forward. Position is therefore a best-effort estimate under
//! sustained overload, never a hard guarantee.

use crate::config::StepperCfg;
use std::time::{Duration, Instant};
use winch_traits::{Direction, StepDriver};

#[derive(Debug, Default, Clone, Copy)]
pub struct EmitOutcome {
    /// Pulses emitted this tick (≤ max_pulses_per_tick).
    pub pulses: u8,
    /// Late pulses were discarded instead of burst out.
    pub backlog_dropped: bool,
    /// A stop-at target was hit exactly; remaining pulses were suppressed.
    pub reached_target: bool,
}

#[derive(Debug)]
pub struct StepScheduler {
    cfg: StepperCfg,
    next_deadline: Option<Instant>,
    last_dir_written: Option<Direction>,
}

impl StepScheduler {
    pub fn new(cfg: StepperCfg) -> Self {
        Self {
            cfg,
            next_deadline: None,
            last_dir_written: None,
        }
    }

    /// Forget accumulated schedule debt; the next pulse is due immediately.
    /// Called on mode changes and after a direction flip so stale deadlines
    /// cannot burst.
    pub fn reset(&mut self) {
        self.next_deadline = None;
    }

    /// Pulse interval for a speed, clamped to the drive's minimum spacing.
    /// Speeds at or below zero, and speeds too slow for `Duration` to hold
    /// the reciprocal, saturate to one second.
    pub fn interval_for(&self, speed_sps: f32) -> Duration {
        const SLOWEST: Duration = Duration::from_secs(1);
        if speed_sps <= 0.0 {
            return SLOWEST;
        }
        Duration::try_from_secs_f32(1.0 / speed_sps)
            .map_or(SLOWEST, |d| d.max(self.cfg.min_interval))
    }

    /// Emit due pulses for this tick.
    ///
    /// `stop_at` carries the move target when exact-stop checking applies
    /// (Move mode, not reversing). Each pulse moves `position` by exactly
    /// one step in `direction`; DIR is rewritten before STEP whenever the
    /// direction changed since the last pulse.
    pub fn emit<D: StepDriver>(
        &mut self,
        driver: &mut D,
        now: Instant,
        speed_sps: f32,
        min_speed_sps: f32,
        direction: Direction,
        position: &mut i64,
        stop_at: Option<i64>,
    ) -> crate::error::Result<EmitOutcome> {
        let mut out = EmitOutcome::default();
        // min_speed may legitimately be configured as zero, so standstill
        // must be caught on its own
        if speed_sps <= 0.0 || speed_sps < min_speed_sps {
            self.next_deadline = None;
            return Ok(out);
        }

        let interval = self.interval_for(speed_sps);
        let mut deadline = self.next_deadline.unwrap_or(now);

        while out.pulses < self.cfg.max_pulses_per_tick && deadline <= now {
            if self.last_dir_written != Some(direction) {
                driver.set_direction(direction).map_err(|e| {
                    eyre::Report::new(crate::error::WinchError::Driver(e.to_string()))
                })?;
                self.last_dir_written = Some(direction);
            }
            driver.pulse(self.cfg.pulse_width).map_err(|e| {
                eyre::Report::new(crate::error::WinchError::Driver(e.to_string()))
            })?;
            *position += direction.sign();
            out.pulses += 1;
            deadline += interval;

            if stop_at == Some(*position) {
                out.reached_target = true;
                break;
            }
        }

        // Bound schedule debt to one interval; late pulses are dropped.
        if deadline <= now {
            out.backlog_dropped = true;
            tracing::trace!(pulses = out.pulses, "step backlog dropped");
            deadline = now + interval;
        }
        self.next_deadline = Some(deadline);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::SpyDriver;

    fn sched() -> StepScheduler {
        StepScheduler::new(StepperCfg::default())
    }

    #[test]
    fn no_pulses_below_min_speed() {
        let mut s = sched();
        let mut drv = SpyDriver::default();
        let mut pos = 0i64;
        let out = s
            .emit(
                &mut drv,
                Instant::now(),
                10.0,
                80.0,
                Direction::ToWell,
                &mut pos,
                None,
            )
            .unwrap();
        assert_eq!(out.pulses, 0);
        assert_eq!(pos, 0);
        assert_eq!(drv.steps, 0);
    }

    #[test]
    fn interval_is_clamped_to_min_spacing() {
        let s = sched();
        // 1 MHz requested, clamped to the 20µs minimum spacing
        assert_eq!(s.interval_for(1_000_000.0), Duration::from_micros(20));
        assert_eq!(s.interval_for(1000.0), Duration::from_millis(1));
        // degenerate speeds saturate instead of overflowing
        assert_eq!(s.interval_for(0.0), Duration::from_secs(1));
        assert_eq!(s.interval_for(-5.0), Duration::from_secs(1));
    }

    #[test]
    fn zero_speed_with_zero_floor_emits_nothing() {
        let mut s = sched();
        let mut drv = SpyDriver::default();
        let mut pos = 0i64;
        let out = s
            .emit(
                &mut drv,
                Instant::now(),
                0.0,
                0.0,
                Direction::ToWell,
                &mut pos,
                None,
            )
            .unwrap();
        assert_eq!(out.pulses, 0);
        assert_eq!(drv.steps, 0);
    }

    #[test]
    fn per_tick_pulse_cap_and_backlog_drop() {
        let mut s = sched();
        let mut drv = SpyDriver::default();
        let mut pos = 0i64;
        let t0 = Instant::now();
        // schedule far behind: first call establishes deadline at t0
        s.emit(&mut drv, t0, 1000.0, 10.0, Direction::ToWell, &mut pos, None)
            .unwrap();
        // 100ms later, 100 pulses would be due; only 4 may fire
        let out = s
            .emit(
                &mut drv,
                t0 + Duration::from_millis(100),
                1000.0,
                10.0,
                Direction::ToWell,
                &mut pos,
                None,
            )
            .unwrap();
        assert_eq!(out.pulses, 4);
        assert!(out.backlog_dropped);
        // deadline snapped forward: immediately after, nothing is due
        let out = s
            .emit(
                &mut drv,
                t0 + Duration::from_millis(100),
                1000.0,
                10.0,
                Direction::ToWell,
                &mut pos,
                None,
            )
            .unwrap();
        assert_eq!(out.pulses, 0);
    }

    #[test]
    fn dir_written_before_step_on_change() {
        use crate::mocks::DriverEvent;
        let mut s = sched();
        let mut drv = SpyDriver::default();
        let mut pos = 0i64;
        let t0 = Instant::now();
        s.emit(&mut drv, t0, 1000.0, 10.0, Direction::ToWell, &mut pos, None)
            .unwrap();
        s.reset();
        s.emit(
            &mut drv,
            t0 + Duration::from_millis(10),
            1000.0,
            10.0,
            Direction::ToHome,
            &mut pos,
            None,
        )
        .unwrap();
        let evs = &drv.events;
        assert_eq!(evs[0], DriverEvent::Dir(Direction::ToWell));
        assert_eq!(evs[1], DriverEvent::Step);
        assert_eq!(evs[2], DriverEvent::Dir(Direction::ToHome));
        assert_eq!(evs[3], DriverEvent::Step);
        assert_eq!(pos, 0); // one up, one down
    }

    #[test]
    fn exact_stop_suppresses_remaining_pulses() {
        let mut s = sched();
        let mut drv = SpyDriver::default();
        let mut pos = 0i64;
        let t0 = Instant::now();
        s.emit(&mut drv, t0, 1000.0, 10.0, Direction::ToWell, &mut pos, Some(2))
            .unwrap();
        // far behind: up to 4 due, but target at +2 stops the tick early
        let out = s
            .emit(
                &mut drv,
                t0 + Duration::from_millis(100),
                1000.0,
                10.0,
                Direction::ToWell,
                &mut pos,
                Some(2),
            )
            .unwrap();
        assert!(out.reached_target);
        assert_eq!(pos, 2);
    }
}
