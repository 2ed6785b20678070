//! Randomized invariant checks over input and command sequences.

use proptest::prelude::*;
use std::time::{Duration, Instant};
use winch_core::mocks::SpyDriver;
use winch_core::{
    ButtonCfg, Command, Inputs, MotionCfg, SafetyCfg, StepperCfg, WinchController,
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

fn controller() -> WinchController<SpyDriver> {
    WinchController::builder()
        .driver(SpyDriver::default())
        .motion(motion())
        .stepper(StepperCfg::default())
        .buttons(ButtonCfg::default())
        .safety(SafetyCfg::default())
        .build()
        .unwrap()
}

#[derive(Debug, Clone)]
enum Event {
    Quiet(u16),
    Buttons { left: bool, right: bool, ms: u16 },
    Estop(u16),
    Cmd(Command),
}

fn event_strategy() -> impl Strategy<Value = Event> {
    prop_oneof![
        (1u16..400).prop_map(Event::Quiet),
        (any::<bool>(), any::<bool>(), 1u16..400)
            .prop_map(|(left, right, ms)| Event::Buttons { left, right, ms }),
        (1u16..200).prop_map(Event::Estop),
        (-3000i64..3000).prop_map(|t| Event::Cmd(Command::GoTo(t))),
        (-500i64..500).prop_map(|d| Event::Cmd(Command::MoveRelative(d))),
        Just(Event::Cmd(Command::Stop)),
        Just(Event::Cmd(Command::Jog(winch_traits::Direction::ToWell))),
        Just(Event::Cmd(Command::Jog(winch_traits::Direction::ToHome))),
        Just(Event::Cmd(Command::JogStop)),
        (0.1f32..25.0).prop_map(|v| Event::Cmd(Command::SetJogSpeed(v))),
        (0.1f32..25.0).prop_map(|v| Event::Cmd(Command::SetMoveSpeed(v))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Per-tick pulse count never exceeds the configured cap, the position
    /// delta matches the pulse count, speed stays under the hardware
    /// ceiling, and an e-stop tick never steps.
    #[test]
    fn tick_invariants_hold_for_arbitrary_input(events in prop::collection::vec(event_strategy(), 1..40)) {
        let mut ctl = controller();
        let mut now = Instant::now();
        let cap = StepperCfg::default().max_pulses_per_tick;

        for ev in events {
            let (inputs, ms) = match ev {
                Event::Quiet(ms) => (Inputs::default(), ms),
                Event::Buttons { left, right, ms } => (
                    Inputs { jog_left: left, jog_right: right, ..Inputs::default() },
                    ms,
                ),
                Event::Estop(ms) => (Inputs { estop: true, ..Inputs::default() }, ms),
                Event::Cmd(cmd) => {
                    ctl.apply_command(cmd, now);
                    (Inputs::default(), 1)
                }
            };
            for _ in 0..ms {
                let before = ctl.position();
                let rep = ctl.tick(now, &inputs).unwrap();
                now += Duration::from_millis(1);

                prop_assert!(rep.pulses <= cap);
                prop_assert_eq!(
                    ctl.position().abs_diff(before),
                    u64::from(rep.pulses)
                );
                // hardware ceiling is 2 rev/s in this config
                prop_assert!(ctl.status().speed_rps <= 2.0 + 1e-4);
                if inputs.estop {
                    prop_assert_eq!(rep.pulses, 0);
                }
            }
        }
    }

    /// Whatever happened before, clearing all demand brings the line to a
    /// standstill within the deceleration time, and it stays parked.
    #[test]
    fn quiescence_after_demand_clears(events in prop::collection::vec(event_strategy(), 1..20)) {
        let mut ctl = controller();
        let mut now = Instant::now();

        for ev in events {
            let (inputs, ms) = match ev {
                Event::Quiet(ms) => (Inputs::default(), ms),
                Event::Buttons { left, right, ms } => (
                    Inputs { jog_left: left, jog_right: right, ..Inputs::default() },
                    ms,
                ),
                Event::Estop(ms) => (Inputs { estop: true, ..Inputs::default() }, ms),
                Event::Cmd(cmd) => {
                    ctl.apply_command(cmd, now);
                    (Inputs::default(), 1)
                }
            };
            for _ in 0..ms {
                ctl.tick(now, &inputs).unwrap();
                now += Duration::from_millis(1);
            }
        }

        ctl.apply_command(Command::Stop, now);
        ctl.apply_command(Command::JogStop, now);
        // 2000 sps / 20000 sps^2 = 100ms to decay; leave margin
        for _ in 0..2000 {
            ctl.tick(now, &Inputs::default()).unwrap();
            now += Duration::from_millis(1);
        }
        let parked = ctl.position();
        for _ in 0..100 {
            let rep = ctl.tick(now, &Inputs::default()).unwrap();
            now += Duration::from_millis(1);
            prop_assert_eq!(rep.pulses, 0);
        }
        prop_assert_eq!(ctl.position(), parked);
    }
}
