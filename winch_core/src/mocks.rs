//! Test doubles for the hardware seams.
//!
//! Compiled unconditionally so integration tests and the simulation
//! front-end can share them.

use std::time::Duration;
use winch_traits::{Direction, StepDriver};

/// Everything a driver was told to do, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    Enable(bool),
    Dir(Direction),
    Step,
}

/// Records every driver call; never fails.
#[derive(Debug, Default)]
pub struct SpyDriver {
    pub events: Vec<DriverEvent>,
    pub steps: u64,
    pub enabled: Option<bool>,
    pub last_dir: Option<Direction>,
}

impl StepDriver for SpyDriver {
    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.enabled = Some(enabled);
        self.events.push(DriverEvent::Enable(enabled));
        Ok(())
    }

    fn set_direction(
        &mut self,
        dir: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.last_dir = Some(dir);
        self.events.push(DriverEvent::Dir(dir));
        Ok(())
    }

    fn pulse(&mut self, _width: Duration) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.steps += 1;
        self.events.push(DriverEvent::Step);
        Ok(())
    }
}

/// Fails every call, for error-propagation tests.
#[derive(Debug, Default)]
pub struct FailingDriver;

impl StepDriver for FailingDriver {
    fn set_enabled(
        &mut self,
        _enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("gpio write failed".into())
    }

    fn set_direction(
        &mut self,
        _dir: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("gpio write failed".into())
    }

    fn pulse(&mut self, _width: Duration) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("gpio write failed".into())
    }
}
