//! Human-readable error descriptions for common failure modes.

/// Map an `eyre::Report` to an explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use winch_core::{BuildError, WinchError};

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDriver => {
                "What happened: No step driver was provided to the controller.\nLikely causes: GPIO initialization failed or the builder was not given a driver.\nHow to fix: Check the [pins] table in the config, or run with --sim.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/winch.toml for a sample."
            ),
        };
    }

    if let Some(WinchError::Driver(msg)) = err.downcast_ref::<WinchError>() {
        return format!(
            "What happened: A GPIO write failed ({msg}).\nLikely causes: Wrong pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process may access the GPIO character device."
        );
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("gpio") || lower.contains("pin") {
        return format!(
            "{msg}\nLikely causes: Incorrect pin numbers or missing GPIO permissions.\nHow to fix: Check the [pins] table and device permissions, or run with --sim."
        );
    }
    msg
}
