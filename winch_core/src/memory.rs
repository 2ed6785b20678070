//! Volatile position memory: two named setpoints (home, well).
//!
//! Slots start unsaved; recalling an unsaved slot is a no-op for the
//! caller. Saves overwrite. Nothing persists across restarts.

/// One saved setpoint. `steps` is meaningful only when `saved` is true.
#[derive(Debug, Clone, Copy, Default)]
pub struct Setpoint {
    steps: i64,
    saved: bool,
}

impl Setpoint {
    pub fn save(&mut self, steps: i64) {
        self.steps = steps;
        self.saved = true;
    }

    pub fn recall(&self) -> Option<i64> {
        self.saved.then_some(self.steps)
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }
}

#[derive(Debug, Default)]
pub struct PositionMemory {
    pub home: Setpoint,
    pub well: Setpoint,
}
