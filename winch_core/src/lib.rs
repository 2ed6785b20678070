#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core winch motion logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent motion engine. All hardware
//! interactions go through the `winch_traits::StepDriver` and
//! `winch_traits::LevelInput` traits.
//!
//! ## Architecture
//!
//! - **Commands**: ASCII remote protocol (`command` module)
//! - **Buttons**: Debounce plus tap/long-press classification (`buttons`)
//! - **Profile**: Soft-start ramps and stopping-distance deceleration
//!   (`profile`)
//! - **Stepper**: Deadline-scheduled pulse emission with a per-tick cap
//!   (`stepper`)
//! - **Controller**: Idle/Jog/Move state machine driven by `tick`
//!   (`controller`)
//!
//! Time enters the engine only through `Instant` arguments, so every piece
//! is testable with synthetic clocks.

pub mod buttons;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod memory;
pub mod mocks;
pub mod profile;
pub mod status;
pub mod stepper;

pub use command::Command;
pub use config::{ButtonCfg, MotionCfg, SafetyCfg, StepperCfg};
pub use controller::{ControllerBuilder, Inputs, Mode, TickReport, WinchController};
pub use error::{BuildError, Result, WinchError};
pub use status::StatusSnapshot;
