pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

/// Commanded step polarity of the drive's DIR line.
///
/// `ToWell` pays line out toward the well side (+1 per step), `ToHome`
/// winds it back toward home (-1 per step). The electrical sense of the
/// DIR level is a wiring concern (see the `dir_inverted` pin option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    ToWell,
    ToHome,
}

impl Direction {
    /// Signed unit step for dead-reckoning.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::ToWell => 1,
            Direction::ToHome => -1,
        }
    }

    /// Direction required to travel a signed step delta. Callers never
    /// command a zero-delta move; zero maps to `ToWell` by convention.
    #[inline]
    pub fn from_delta(delta: i64) -> Self {
        if delta >= 0 {
            Direction::ToWell
        } else {
            Direction::ToHome
        }
    }
}

/// STEP/DIR/ENABLE interface to an external stepper drive.
///
/// Implementations own the output lines. `pulse` must hold STEP high for at
/// least `width` (a bounded busy-wait on real hardware, a no-op in fakes);
/// the controller depends only on the capability, not the delay mechanism.
pub trait StepDriver {
    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn set_direction(
        &mut self,
        dir: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn pulse(&mut self, width: Duration) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A sampled digital input line (button or e-stop), polarity already
/// normalized by the implementation: `true` means asserted/pressed.
pub trait LevelInput {
    fn is_asserted(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
