use rstest::rstest;
use winch_config::load_toml;

const PINS: &str = r#"
[pins]
step = 8
dir = 9
enable = 10
home_button = 5
well_button = 4
jog_left_button = 2
jog_right_button = 3
estop = 6
"#;

#[test]
fn accepts_pins_only_config_with_defaults() {
    let cfg = load_toml(PINS).expect("parse TOML");
    cfg.validate().expect("defaults should validate");
    assert_eq!(cfg.motion.steps_per_rev, 4000);
    assert_eq!(cfg.buttons.debounce_ms, 25);
    assert_eq!(cfg.buttons.long_press_ms, 1200);
    assert_eq!(cfg.stepper.max_pulses_per_tick, 4);
    assert!(cfg.estop.active_low);
}

#[rstest]
#[case::zero_steps_per_rev("[motion]\nsteps_per_rev = 0\n", "steps_per_rev must be > 0")]
#[case::soft_accel_above_steady("[motion]\naccel_rps2 = 1.0\nsoft_accel_rps2 = 2.0\n", "soft_accel_rps2")]
#[case::long_press_not_above_debounce("[buttons]\ndebounce_ms = 50\nlong_press_ms = 50\n", "long_press_ms")]
#[case::pulse_width_at_min_interval("[stepper]\nmin_interval_us = 3\npulse_width_us = 3\n", "pulse_width_us")]
#[case::cmd_min_below_start_floor("[motion]\ncmd_speed_min_rps = 0.05\n", "cmd_speed_min_rps")]
fn rejects_invalid_values(#[case] fragment: &str, #[case] expected: &str) {
    let toml = format!("{PINS}\n{fragment}");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should fail validation");
    assert!(
        format!("{err}").contains(expected),
        "message missing {expected:?}: {err}"
    );
}

#[test]
fn rejects_missing_pins_table() {
    let toml = "[motion]\njog_max_rps = 5.0\n";
    assert!(load_toml(toml).is_err());
}

#[test]
fn parses_polarity_options() {
    let toml = format!(
        "{}\ndir_inverted = true\nenable_active_low = false\n\n[estop]\nactive_low = false\n",
        PINS.trim_end()
    );
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("valid");
    assert!(cfg.pins.dir_inverted);
    assert!(!cfg.pins.enable_active_low);
    assert!(!cfg.estop.active_low);
}
