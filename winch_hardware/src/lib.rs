#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
//! Hardware bindings for the winch controller.
//!
//! `SimulatedDriver` and `SimulatedLevel` run anywhere and back the `--sim`
//! front-end; the Raspberry Pi GPIO implementations live behind the
//! `hardware` feature and compile only on Linux.

pub mod error;
pub mod util;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use winch_traits::{Direction, LevelInput, StepDriver};

/// Pure-software step driver that tracks a shadow position.
#[derive(Debug, Default)]
pub struct SimulatedDriver {
    enabled: bool,
    dir: Direction,
    position: i64,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl StepDriver for SimulatedDriver {
    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(enabled, "drive enable (simulated)");
        self.enabled = enabled;
        Ok(())
    }

    fn set_direction(
        &mut self,
        dir: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(?dir, "direction (simulated)");
        self.dir = dir;
        Ok(())
    }

    fn pulse(&mut self, _width: Duration) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.enabled {
            self.position += self.dir.sign();
        }
        Ok(())
    }
}

/// Shared boolean input level, togglable from another thread.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLevel {
    state: Arc<AtomicBool>,
}

impl SimulatedLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle the simulation shell can flip.
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.state)
    }
}

impl LevelInput for SimulatedLevel {
    fn is_asserted(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.state.load(Ordering::Relaxed))
    }
}

#[cfg(feature = "hardware")]
pub use gpio::{GpioLevelInput, GpioStepDriver};

#[cfg(feature = "hardware")]
mod gpio {
    use crate::error::HwError;
    use crate::util::spin_for;
    use rppal::gpio::{Gpio, InputPin, Level, OutputPin};
    use std::time::Duration;
    use winch_traits::{Direction, LevelInput, StepDriver};

    /// STEP/DIR/ENABLE over Raspberry Pi GPIO.
    pub struct GpioStepDriver {
        step: OutputPin,
        dir: OutputPin,
        enable: OutputPin,
        dir_inverted: bool,
        enable_active_low: bool,
    }

    impl GpioStepDriver {
        pub fn new(pins: &winch_config::Pins) -> crate::error::Result<Self> {
            let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let get = |n: u8| {
                gpio.get(n)
                    .map(rppal::gpio::Pin::into_output_low)
                    .map_err(|e| HwError::Gpio(format!("pin {n}: {e}")))
            };
            let mut drv = Self {
                step: get(pins.step)?,
                dir: get(pins.dir)?,
                enable: get(pins.enable)?,
                dir_inverted: pins.dir_inverted,
                enable_active_low: pins.enable_active_low,
            };
            // start disabled regardless of enable polarity
            drv.write_enable(false);
            Ok(drv)
        }

        fn write_enable(&mut self, enabled: bool) {
            if enabled != self.enable_active_low {
                self.enable.set_high();
            } else {
                self.enable.set_low();
            }
        }
    }

    impl StepDriver for GpioStepDriver {
        fn set_enabled(
            &mut self,
            enabled: bool,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            tracing::info!(enabled, "drive enable");
            self.write_enable(enabled);
            Ok(())
        }

        fn set_direction(
            &mut self,
            dir: Direction,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let high = (dir == Direction::ToWell) != self.dir_inverted;
            if high {
                self.dir.set_high();
            } else {
                self.dir.set_low();
            }
            Ok(())
        }

        fn pulse(
            &mut self,
            width: Duration,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.step.set_high();
            spin_for(width);
            self.step.set_low();
            Ok(())
        }
    }

    /// One debounce-raw input line with an internal pull-up. Buttons and
    /// the normally-closed e-stop loop both read asserted on a low level
    /// when `active_low` is set.
    pub struct GpioLevelInput {
        pin: InputPin,
        active_low: bool,
    }

    impl GpioLevelInput {
        pub fn new(pin_no: u8, active_low: bool) -> crate::error::Result<Self> {
            let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let pin = gpio
                .get(pin_no)
                .map_err(|e| HwError::Gpio(format!("pin {pin_no}: {e}")))?
                .into_input_pullup();
            Ok(Self { pin, active_low })
        }
    }

    impl LevelInput for GpioLevelInput {
        fn is_asserted(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
            let level = self.pin.read();
            Ok((level == Level::Low) == self.active_low)
        }
    }
}
