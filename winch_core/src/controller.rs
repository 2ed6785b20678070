//! Winch motion controller: mode state machine and tick pipeline.
//!
//! One `tick` call samples inputs, advances the debouncers, applies mode
//! transitions, updates the velocity profile and emits due STEP pulses.
//! Time enters only through the `now` argument, so tests drive the whole
//! controller with synthetic instants.

use crate::buttons::{ButtonEvent, DebouncedButton, net_jog_demand};
use crate::command::Command;
use crate::config::{ButtonCfg, MotionCfg, SafetyCfg, StepperCfg};
use crate::error::{BuildError, Result};
use crate::memory::PositionMemory;
use crate::profile::VelocityProfile;
use crate::status::StatusSnapshot;
use crate::stepper::StepScheduler;
use std::time::Instant;
use tracing::{debug, warn};
use winch_traits::{Direction, StepDriver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Jog,
    Move,
}

/// Raw input levels for one tick, polarity already normalized
/// (`true` = pressed / asserted).
#[derive(Debug, Clone, Copy, Default)]
pub struct Inputs {
    pub home_btn: bool,
    pub well_btn: bool,
    pub jog_left: bool,
    pub jog_right: bool,
    pub estop: bool,
}

/// What one tick did, for the host loop and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickReport {
    pub pulses: u8,
    pub backlog_dropped: bool,
    pub reached_target: bool,
    pub estop: bool,
}

#[derive(Debug)]
pub struct WinchController<D: StepDriver> {
    driver: D,
    profile: VelocityProfile,
    scheduler: StepScheduler,
    safety: SafetyCfg,
    memory: PositionMemory,

    home_btn: DebouncedButton,
    well_btn: DebouncedButton,

    mode: Mode,
    speed_sps: f32,
    direction: Direction,
    position: i64,
    target: Option<i64>,
    reversing: bool,
    /// Target adopted once the reversal deceleration completes.
    pending_target: Option<i64>,
    remote_jog: Option<Direction>,
    jog_ceiling_sps: f32,
    move_ceiling_sps: f32,

    estop: bool,
    started: bool,
    last_tick: Option<Instant>,
    motion_start: Option<Instant>,
    settle_until: Option<Instant>,
    brake_until: Option<Instant>,
}

pub struct ControllerBuilder<D: StepDriver> {
    driver: Option<D>,
    motion: MotionCfg,
    stepper: StepperCfg,
    buttons: ButtonCfg,
    safety: SafetyCfg,
}

impl<D: StepDriver> Default for ControllerBuilder<D> {
    fn default() -> Self {
        Self {
            driver: None,
            motion: MotionCfg::default(),
            stepper: StepperCfg::default(),
            buttons: ButtonCfg::default(),
            safety: SafetyCfg::default(),
        }
    }
}

impl<D: StepDriver> ControllerBuilder<D> {
    pub fn driver(mut self, driver: D) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn motion(mut self, cfg: MotionCfg) -> Self {
        self.motion = cfg;
        self
    }

    pub fn stepper(mut self, cfg: StepperCfg) -> Self {
        self.stepper = cfg;
        self
    }

    pub fn buttons(mut self, cfg: ButtonCfg) -> Self {
        self.buttons = cfg;
        self
    }

    pub fn safety(mut self, cfg: SafetyCfg) -> Self {
        self.safety = cfg;
        self
    }

    pub fn build(self) -> std::result::Result<WinchController<D>, BuildError> {
        let driver = self.driver.ok_or(BuildError::MissingDriver)?;
        if self.stepper.max_pulses_per_tick == 0 {
            return Err(BuildError::InvalidConfig("max_pulses_per_tick must be >= 1"));
        }
        if self.motion.min_speed_sps > self.motion.start_floor_sps {
            return Err(BuildError::InvalidConfig(
                "min_speed must not exceed the start floor",
            ));
        }
        let jog_ceiling_sps = self.motion.jog_max_sps;
        let move_ceiling_sps = self.motion.move_max_sps;
        Ok(WinchController {
            driver,
            profile: VelocityProfile::new(self.motion),
            scheduler: StepScheduler::new(self.stepper),
            safety: self.safety,
            memory: PositionMemory::default(),
            home_btn: DebouncedButton::new(self.buttons),
            well_btn: DebouncedButton::new(self.buttons),
            mode: Mode::Idle,
            speed_sps: 0.0,
            direction: Direction::ToWell,
            position: 0,
            target: None,
            reversing: false,
            pending_target: None,
            remote_jog: None,
            jog_ceiling_sps,
            move_ceiling_sps,
            estop: false,
            started: false,
            last_tick: None,
            motion_start: None,
            settle_until: None,
            brake_until: None,
        })
    }
}

impl<D: StepDriver> WinchController<D> {
    pub fn builder() -> ControllerBuilder<D> {
        ControllerBuilder::default()
    }

    /// Advance the controller by one tick.
    pub fn tick(&mut self, now: Instant, inputs: &Inputs) -> Result<TickReport> {
        if !self.started {
            self.enable_drive(now)?;
            self.started = true;
        }

        let dt = self
            .last_tick
            .map(|t| now.saturating_duration_since(t).as_secs_f32())
            .unwrap_or(0.0)
            .min(0.1);
        self.last_tick = Some(now);

        if self.handle_estop(now, inputs.estop)? {
            return Ok(TickReport {
                estop: true,
                ..TickReport::default()
            });
        }

        self.service_buttons(now, inputs);
        self.apply_jog_demand(now, inputs);

        let gated = self.motion_gated(now);
        if !gated {
            self.update_speed(now, dt);
        }

        // Degenerate move: target equals the current position. Drop the
        // target and let the Idle decay path run any residual speed out.
        if self.mode == Mode::Move && !self.reversing && self.target == Some(self.position) {
            self.target = None;
            self.mode = Mode::Idle;
        }

        let mut report = TickReport::default();
        if !gated {
            let stop_at = (self.mode == Mode::Move && !self.reversing)
                .then_some(self.target)
                .flatten();
            let out = self.scheduler.emit(
                &mut self.driver,
                now,
                self.speed_sps,
                self.profile.cfg().min_speed_sps,
                self.direction,
                &mut self.position,
                stop_at,
            )?;
            report.pulses = out.pulses;
            report.backlog_dropped = out.backlog_dropped;
            if out.reached_target {
                self.finish_move();
                report.reached_target = true;
            }
        }

        if self.mode == Mode::Idle && self.speed_sps < self.profile.cfg().min_speed_sps {
            self.speed_sps = 0.0;
        }
        Ok(report)
    }

    /// Apply one remote command. Silently discarded while e-stop is latched
    /// so stale commands cannot replay on release.
    pub fn apply_command(&mut self, cmd: Command, now: Instant) {
        if self.estop {
            debug!(?cmd, "command discarded while e-stop latched");
            return;
        }
        match cmd {
            Command::Jog(dir) => self.remote_jog = Some(dir),
            Command::JogStop => self.remote_jog = None,
            Command::GoHome => match self.memory.home.recall() {
                Some(t) => self.request_move(t, now),
                None => warn!("GH ignored, home position not saved"),
            },
            Command::GoWell => match self.memory.well.recall() {
                Some(t) => self.request_move(t, now),
                None => warn!("GW ignored, well position not saved"),
            },
            Command::SaveHome => {
                self.memory.home.save(self.position);
                debug!(steps = self.position, "home position saved");
            }
            Command::SaveWell => {
                self.memory.well.save(self.position);
                debug!(steps = self.position, "well position saved");
            }
            Command::Stop => {
                self.remote_jog = None;
                if self.mode == Mode::Move {
                    // decelerate in place through the Idle decay path
                    self.target = None;
                    self.pending_target = None;
                    self.reversing = false;
                    self.mode = Mode::Idle;
                }
            }
            Command::ZeroPosition => {
                if self.mode == Mode::Idle && self.speed_sps == 0.0 {
                    self.position = 0;
                } else {
                    warn!("ZP ignored while in motion");
                }
            }
            Command::GoTo(t) => self.request_move(t, now),
            Command::MoveRelative(d) => self.request_move(self.position.saturating_add(d), now),
            Command::SetJogSpeed(rps) => {
                if self.speed_in_range(rps) {
                    let cfg = self.profile.cfg();
                    self.jog_ceiling_sps = cfg.sps(rps).min(cfg.jog_max_sps);
                } else {
                    warn!(rps, "VJ out of range, ignored");
                }
            }
            Command::SetMoveSpeed(rps) => {
                if self.speed_in_range(rps) {
                    let cfg = self.profile.cfg();
                    self.move_ceiling_sps = cfg.sps(rps).min(cfg.move_max_sps);
                } else {
                    warn!(rps, "VM out of range, ignored");
                }
            }
            // answered by the host shell from `status()`
            Command::Query => {}
        }
    }

    pub fn status(&self) -> StatusSnapshot {
        let cfg = self.profile.cfg();
        StatusSnapshot {
            position: self.position,
            mode: self.mode,
            speed_rps: cfg.rps(self.speed_sps),
            home: self.memory.home.recall(),
            well: self.memory.well.recall(),
            estop: self.estop,
            jog_rps: cfg.rps(self.jog_ceiling_sps),
            move_rps: cfg.rps(self.move_ceiling_sps),
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn estop_latched(&self) -> bool {
        self.estop
    }

    /// Borrow the underlying driver, mainly for test assertions against
    /// recording fakes.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Drop the ENABLE line on the way out so the brake engages.
    pub fn shutdown(&mut self) -> Result<()> {
        self.speed_sps = 0.0;
        self.mode = Mode::Idle;
        self.scheduler.reset();
        self.driver
            .set_enabled(false)
            .map_err(|e| eyre::Report::new(crate::error::WinchError::Driver(e.to_string())))?;
        Ok(())
    }

    fn speed_in_range(&self, rps: f32) -> bool {
        let cfg = self.profile.cfg();
        (cfg.cmd_speed_min_rps..=cfg.cmd_speed_max_rps).contains(&rps)
    }

    fn enable_drive(&mut self, now: Instant) -> Result<()> {
        self.driver
            .set_enabled(true)
            .map_err(|e| eyre::Report::new(crate::error::WinchError::Driver(e.to_string())))?;
        self.settle_until = Some(now + self.safety.enable_settle);
        Ok(())
    }

    /// Latch/unlatch the e-stop. Returns true when the tick must stop here.
    fn handle_estop(&mut self, now: Instant, asserted: bool) -> Result<bool> {
        if asserted {
            if !self.estop {
                warn!("e-stop asserted, drive disabled");
                self.estop = true;
                self.driver.set_enabled(false).map_err(|e| {
                    eyre::Report::new(crate::error::WinchError::Driver(e.to_string()))
                })?;
                self.speed_sps = 0.0;
                self.mode = Mode::Idle;
                self.target = None;
                self.pending_target = None;
                self.reversing = false;
                self.remote_jog = None;
                self.scheduler.reset();
            }
            return Ok(true);
        }
        if self.estop {
            warn!("e-stop released, drive re-enabled");
            self.estop = false;
            self.enable_drive(now)?;
        }
        Ok(false)
    }

    fn service_buttons(&mut self, now: Instant, inputs: &Inputs) {
        if let Some(ev) = self.home_btn.update(inputs.home_btn, now) {
            match ev {
                ButtonEvent::Tap => self.apply_command(Command::GoHome, now),
                ButtonEvent::LongPress => self.apply_command(Command::SaveHome, now),
            }
        }
        if let Some(ev) = self.well_btn.update(inputs.well_btn, now) {
            match ev {
                ButtonEvent::Tap => self.apply_command(Command::GoWell, now),
                ButtonEvent::LongPress => self.apply_command(Command::SaveWell, now),
            }
        }
    }

    /// Resolve local and remote jog demand into mode transitions. Jog is a
    /// level input sampled raw, not through the debouncers; local buttons
    /// take precedence over the remote request.
    fn apply_jog_demand(&mut self, now: Instant, inputs: &Inputs) {
        let local = net_jog_demand(inputs.jog_left, inputs.jog_right);
        let demand = local.or(self.remote_jog);

        match (demand, self.mode) {
            (Some(dir), Mode::Idle) => self.enter_jog_from_idle(dir, now),
            (Some(dir), Mode::Jog) => {
                if dir != self.direction {
                    // immediate flip: restart from the floor rather than
                    // carrying speed through a direction reversal
                    self.direction = dir;
                    self.speed_sps = self.profile.cfg().start_floor_sps;
                    self.scheduler.reset();
                    self.motion_start = Some(now);
                }
            }
            (Some(dir), Mode::Move) => {
                // jog preempts the move
                self.target = None;
                self.pending_target = None;
                self.reversing = false;
                self.mode = Mode::Jog;
                if dir == self.direction {
                    self.speed_sps = self.speed_sps.min(self.jog_ceiling_sps);
                } else {
                    self.direction = dir;
                    self.speed_sps = self.profile.cfg().start_floor_sps;
                    self.scheduler.reset();
                    self.motion_start = Some(now);
                }
            }
            (None, Mode::Jog) => {
                // demand gone: decay to a stop through Idle
                self.mode = Mode::Idle;
                self.brake_until = None;
            }
            (None, _) => {}
        }
    }

    fn enter_jog_from_idle(&mut self, dir: Direction, now: Instant) {
        self.mode = Mode::Jog;
        if self.speed_sps < self.profile.cfg().min_speed_sps {
            // from standstill the brake needs time to release before the
            // first pulse; the soft-start window begins when it ends
            self.direction = dir;
            self.scheduler.reset();
            let release = now + self.safety.brake_release;
            self.brake_until = Some(release);
            self.motion_start = Some(release);
        } else if dir != self.direction {
            // still decaying the other way: restart from the floor, same
            // as a flip while jogging
            self.direction = dir;
            self.speed_sps = self.profile.cfg().start_floor_sps;
            self.scheduler.reset();
            self.motion_start = Some(now);
        }
        // same direction with residual speed: pick the decaying motion
        // back up under the original soft-start window
    }

    fn request_move(&mut self, target: i64, now: Instant) {
        if self.mode == Mode::Move && self.reversing {
            let toward = Direction::from_delta(target - self.position);
            if toward == self.direction {
                // new target lies ahead again; abandon the reversal
                self.reversing = false;
                self.pending_target = None;
                self.target = Some(target);
            } else {
                self.pending_target = Some(target);
            }
            return;
        }

        if self.speed_sps >= self.profile.cfg().min_speed_sps {
            let toward = Direction::from_delta(target - self.position);
            if toward != self.direction {
                // decelerate, flip, then run out the commanded target
                self.mode = Mode::Move;
                self.reversing = true;
                self.pending_target = Some(target);
                return;
            }
            self.mode = Mode::Move;
            self.target = Some(target);
            self.speed_sps = self.speed_sps.min(self.move_ceiling_sps);
            return;
        }

        if target == self.position {
            return;
        }
        self.mode = Mode::Move;
        self.target = Some(target);
        self.direction = Direction::from_delta(target - self.position);
        self.speed_sps = 0.0;
        self.scheduler.reset();
        self.motion_start = Some(now);
    }

    fn finish_move(&mut self) {
        self.mode = Mode::Idle;
        self.target = None;
        self.speed_sps = 0.0;
        self.scheduler.reset();
    }

    fn motion_gated(&mut self, now: Instant) -> bool {
        if let Some(t) = self.settle_until {
            if now < t {
                return true;
            }
            self.settle_until = None;
        }
        if let Some(t) = self.brake_until {
            if now < t {
                return true;
            }
            self.brake_until = None;
        }
        false
    }

    fn update_speed(&mut self, now: Instant, dt: f32) {
        let in_soft = self
            .motion_start
            .is_some_and(|t| now.saturating_duration_since(t) < self.profile.cfg().soft_start);

        match self.mode {
            Mode::Idle => {
                self.speed_sps = self.profile.idle(self.speed_sps, dt);
            }
            Mode::Jog => {
                self.speed_sps = self
                    .profile
                    .jog(self.speed_sps, self.jog_ceiling_sps, dt, in_soft);
            }
            Mode::Move => {
                if self.reversing {
                    let (next, flip) = self.profile.reversing(self.speed_sps, dt);
                    self.speed_sps = next;
                    if flip {
                        self.reversing = false;
                        self.target = self.pending_target.take();
                        if let Some(t) = self.target {
                            self.direction = Direction::from_delta(t - self.position);
                            self.speed_sps = self.profile.cfg().start_floor_sps;
                            self.scheduler.reset();
                            self.motion_start = Some(now);
                        } else {
                            self.finish_move();
                        }
                    }
                } else if let Some(t) = self.target {
                    let remaining = t.abs_diff(self.position);
                    self.speed_sps = self.profile.move_toward(
                        self.speed_sps,
                        self.move_ceiling_sps,
                        remaining,
                        dt,
                        in_soft,
                    );
                }
            }
        }
    }
}
