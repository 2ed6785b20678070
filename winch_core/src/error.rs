use thiserror::Error;

/// Runtime failures surfaced to the host. GPIO writes are the only
/// fallible path inside the control loop.
#[derive(Debug, Error, Clone)]
pub enum WinchError {
    #[error("driver error: {0}")]
    Driver(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing step driver")]
    MissingDriver,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
