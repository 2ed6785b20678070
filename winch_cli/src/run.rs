//! Control-loop execution: hardware assembly, stdin command intake, and the
//! fixed-rate tick loop.

use crossbeam_channel::{Receiver, Sender, bounded};
use eyre::WrapErr;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use winch_core::{ButtonCfg, Command, Inputs, MotionCfg, SafetyCfg, StepperCfg, WinchController};
use winch_traits::{Clock, LevelInput, MonotonicClock, StepDriver};

/// Remote commands the reader thread can buffer ahead of the loop.
const COMMAND_QUEUE_DEPTH: usize = 32;

/// The five sampled input lines, behind the `LevelInput` seam so GPIO and
/// simulation share the loop.
pub struct InputLines {
    pub home: Box<dyn LevelInput>,
    pub well: Box<dyn LevelInput>,
    pub jog_left: Box<dyn LevelInput>,
    pub jog_right: Box<dyn LevelInput>,
    pub estop: Box<dyn LevelInput>,
}

impl InputLines {
    fn sample(&mut self) -> eyre::Result<Inputs> {
        let read = |r: Result<bool, Box<dyn std::error::Error + Send + Sync>>| {
            r.map_err(|e| eyre::eyre!("input read failed: {e}"))
        };
        Ok(Inputs {
            home_btn: read(self.home.is_asserted())?,
            well_btn: read(self.well.is_asserted())?,
            jog_left: read(self.jog_left.is_asserted())?,
            jog_right: read(self.jog_right.is_asserted())?,
            estop: read(self.estop.is_asserted())?,
        })
    }
}

/// Read stdin line by line on a dedicated thread. The channel is bounded;
/// when the loop falls behind, excess lines are dropped rather than queued
/// without limit.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx): (Sender<String>, Receiver<String>) = bounded(COMMAND_QUEUE_DEPTH);
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.try_send(line).is_err() {
                    tracing::warn!("command queue full, line dropped");
                }
            }
        })
        .ok();
    rx
}

pub fn install_shutdown_handler() -> eyre::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .wrap_err("install Ctrl-C handler")?;
    Ok(flag)
}

/// Assemble the controller from the file config and run the loop until
/// shutdown is requested.
pub fn run(
    cfg: &winch_config::Config,
    sim: bool,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let commands = spawn_stdin_reader();

    if sim {
        let driver = winch_hardware::SimulatedDriver::new();
        let inputs = InputLines {
            home: Box::new(winch_hardware::SimulatedLevel::new()),
            well: Box::new(winch_hardware::SimulatedLevel::new()),
            jog_left: Box::new(winch_hardware::SimulatedLevel::new()),
            jog_right: Box::new(winch_hardware::SimulatedLevel::new()),
            estop: Box::new(winch_hardware::SimulatedLevel::new()),
        };
        tracing::info!("running with simulated driver and inputs");
        return control_loop(cfg, driver, inputs, commands, shutdown);
    }

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        let driver = winch_hardware::GpioStepDriver::new(&cfg.pins)
            .wrap_err("open STEP/DIR/ENABLE pins")?;
        let button = |pin: u8| -> eyre::Result<Box<dyn LevelInput>> {
            Ok(Box::new(
                winch_hardware::GpioLevelInput::new(pin, true)
                    .wrap_err_with(|| format!("open input pin {pin}"))?,
            ))
        };
        let inputs = InputLines {
            home: button(cfg.pins.home_button)?,
            well: button(cfg.pins.well_button)?,
            jog_left: button(cfg.pins.jog_left_button)?,
            jog_right: button(cfg.pins.jog_right_button)?,
            estop: Box::new(
                winch_hardware::GpioLevelInput::new(cfg.pins.estop, cfg.estop.active_low)
                    .wrap_err("open e-stop pin")?,
            ),
        };
        control_loop(cfg, driver, inputs, commands, shutdown)
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        eyre::bail!("built without the `hardware` feature; use --sim")
    }
}

fn control_loop<D: StepDriver>(
    cfg: &winch_config::Config,
    driver: D,
    mut inputs: InputLines,
    commands: Receiver<String>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let mut ctl = WinchController::builder()
        .driver(driver)
        .motion(MotionCfg::from_file(&cfg.motion))
        .stepper(StepperCfg::from_file(&cfg.stepper))
        .buttons(ButtonCfg::from_file(&cfg.buttons))
        .safety(SafetyCfg::from_file(&cfg.safety))
        .build()?;

    let clock = MonotonicClock::new();
    let tick = Duration::from_secs_f64(1.0 / f64::from(cfg.runner.tick_hz));
    let status_every = (cfg.runner.status_ms > 0)
        .then(|| Duration::from_millis(cfg.runner.status_ms));

    tracing::info!(
        tick_hz = cfg.runner.tick_hz,
        status_ms = cfg.runner.status_ms,
        "control loop started"
    );

    let mut next = clock.now();
    let mut last_status = clock.now();
    while !shutdown.load(Ordering::Relaxed) {
        let now = clock.now();

        for line in commands.try_iter() {
            match Command::parse(&line) {
                Some(Command::Query) => println!("{}", ctl.status()),
                Some(cmd) => ctl.apply_command(cmd, now),
                None => tracing::debug!(%line, "unrecognized command ignored"),
            }
        }

        let sampled = inputs.sample()?;
        let report = ctl.tick(now, &sampled)?;
        if report.backlog_dropped {
            tracing::warn!("tick overrun, step backlog dropped");
        }

        if let Some(every) = status_every
            && now.saturating_duration_since(last_status) >= every
        {
            println!("{}", ctl.status());
            last_status = now;
        }

        next += tick;
        let now = clock.now();
        if next <= now {
            // behind schedule; skip ahead instead of accumulating debt
            next = now + tick;
        }
        clock.sleep(next.saturating_duration_since(now));
    }

    tracing::info!("shutting down");
    ctl.shutdown()
}
