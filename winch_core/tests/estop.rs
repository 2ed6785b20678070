//! Emergency-stop behavior: same-tick shutdown, command discard while
//! latched, and gated recovery on release.

use std::time::{Duration, Instant};
use winch_core::mocks::{DriverEvent, SpyDriver};
use winch_core::{
    ButtonCfg, Command, Inputs, Mode, MotionCfg, SafetyCfg, StepperCfg, WinchController,
};

fn motion() -> MotionCfg {
    MotionCfg {
        steps_per_rev: 1000,
        jog_max_sps: 2000.0,
        move_max_sps: 2000.0,
        accel_sps2: 10_000.0,
        decel_sps2: 20_000.0,
        soft_accel_sps2: 5_000.0,
        soft_start: Duration::from_millis(50),
        start_floor_sps: 400.0,
        min_speed_sps: 100.0,
        cmd_speed_min_rps: 0.4,
        cmd_speed_max_rps: 20.0,
    }
}

fn rig() -> (WinchController<SpyDriver>, Instant) {
    let ctl = WinchController::builder()
        .driver(SpyDriver::default())
        .motion(motion())
        .stepper(StepperCfg::default())
        .buttons(ButtonCfg::default())
        .safety(SafetyCfg::default())
        .build()
        .unwrap();
    (ctl, Instant::now())
}

fn run(ctl: &mut WinchController<SpyDriver>, now: &mut Instant, ms: u64, inputs: Inputs) {
    for _ in 0..ms {
        ctl.tick(*now, &inputs).unwrap();
        *now += Duration::from_millis(1);
    }
}

#[test]
fn assertion_disables_drive_and_halts_in_the_same_tick() {
    let (mut ctl, mut now) = rig();
    run(&mut ctl, &mut now, 100, Inputs::default());
    ctl.apply_command(Command::GoTo(1500), now);
    run(&mut ctl, &mut now, 300, Inputs::default());
    assert_eq!(ctl.mode(), Mode::Move);
    assert!(ctl.status().speed_rps > 0.0);

    let estop = Inputs {
        estop: true,
        ..Inputs::default()
    };
    let rep = ctl.tick(now, &estop).unwrap();
    assert!(rep.estop);
    assert_eq!(rep.pulses, 0);
    assert_eq!(ctl.driver().enabled, Some(false));
    assert_eq!(ctl.mode(), Mode::Idle);
    assert_eq!(ctl.status().speed_rps, 0.0);
    assert!(ctl.estop_latched());

    // held: no pulses ever
    let steps = ctl.driver().steps;
    run(&mut ctl, &mut now, 500, estop);
    assert_eq!(ctl.driver().steps, steps);
}

#[test]
fn commands_arriving_while_latched_are_discarded() {
    let (mut ctl, mut now) = rig();
    run(&mut ctl, &mut now, 100, Inputs::default());

    let estop = Inputs {
        estop: true,
        ..Inputs::default()
    };
    run(&mut ctl, &mut now, 10, estop);
    ctl.apply_command(Command::GoTo(500), now);
    ctl.apply_command(Command::Jog(winch_traits::Direction::ToWell), now);

    // release: nothing queued may replay
    run(&mut ctl, &mut now, 500, Inputs::default());
    assert_eq!(ctl.mode(), Mode::Idle);
    assert_eq!(ctl.driver().steps, 0);
}

#[test]
fn release_re_enables_with_a_settle_window() {
    let (mut ctl, mut now) = rig();
    run(&mut ctl, &mut now, 100, Inputs::default());

    let estop = Inputs {
        estop: true,
        ..Inputs::default()
    };
    run(&mut ctl, &mut now, 10, estop);
    assert_eq!(ctl.driver().enabled, Some(false));

    run(&mut ctl, &mut now, 1, Inputs::default());
    assert_eq!(ctl.driver().enabled, Some(true));
    assert!(!ctl.estop_latched());

    // fresh move right after release waits out the settle window
    ctl.apply_command(Command::GoTo(50), now);
    run(&mut ctl, &mut now, 50, Inputs::default());
    assert_eq!(ctl.driver().steps, 0);
    run(&mut ctl, &mut now, 300, Inputs::default());
    assert_eq!(ctl.position(), 50);

    let enables: Vec<_> = ctl
        .driver()
        .events
        .iter()
        .filter(|e| matches!(e, DriverEvent::Enable(_)))
        .collect();
    // startup enable, latch disable, release enable
    assert_eq!(
        enables,
        vec![
            &DriverEvent::Enable(true),
            &DriverEvent::Enable(false),
            &DriverEvent::Enable(true)
        ]
    );
}

#[test]
fn estop_during_jog_clears_the_remote_demand() {
    let (mut ctl, mut now) = rig();
    run(&mut ctl, &mut now, 100, Inputs::default());
    ctl.apply_command(Command::Jog(winch_traits::Direction::ToWell), now);
    run(&mut ctl, &mut now, 600, Inputs::default());
    assert_eq!(ctl.mode(), Mode::Jog);

    let estop = Inputs {
        estop: true,
        ..Inputs::default()
    };
    run(&mut ctl, &mut now, 10, estop);
    // released with no buttons held: the old JL/JR demand must not resume
    run(&mut ctl, &mut now, 500, Inputs::default());
    assert_eq!(ctl.mode(), Mode::Idle);
}
