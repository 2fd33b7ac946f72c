//! Error types for dda-motion.
//!
//! Provides unified error handling across configuration, move planning and
//! step execution. Arithmetic edge cases and clock-handler reentry are
//! recovered locally and never show up here.

use core::fmt;

use crate::config::Axis;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all dda-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Move planning error
    Plan(PlanError),
    /// Step execution error
    Step(StepError),
    /// Move queue error
    Queue(QueueError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Timer frequency must be non-zero
    InvalidTimerFrequency(u32),
    /// Clock period must be non-zero and fit in timer ticks
    InvalidClockPeriod(u32),
    /// Acceleration must be non-zero
    InvalidAcceleration(u32),
    /// Minimum step interval must be non-zero
    InvalidMinInterval(u32),
    /// Enabled axis without a maximum feedrate
    InvalidMaxFeedrate(Axis),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Move planning errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Target equals current position on every axis
    EmptyMove,
    /// Move requests steps on an axis that is not configured
    AxisDisabled(Axis),
    /// Target position cannot be represented in steps
    Overflow,
}

/// Step execution errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StepError {
    /// Ramp counter moved against the ramp phase. Indicates a planning defect;
    /// the move has been aborted.
    RampDirection {
        /// Step number at which the inconsistency was detected
        step: u32,
        /// Value of the signed ramp counter
        ramp_n: i32,
    },
    /// GPIO pin operation failed
    PinError,
}

/// Move queue errors.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueError {
    /// Queue cannot accept another move
    Full,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Plan(e) => write!(f, "Planning error: {}", e),
            Error::Step(e) => write!(f, "Step error: {}", e),
            Error::Queue(e) => write!(f, "Queue error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidTimerFrequency(v) => {
                write!(f, "Invalid timer frequency: {} Hz. Must be > 0", v)
            }
            ConfigError::InvalidClockPeriod(v) => write!(
                f,
                "Invalid clock period: {} ms. Must be > 0 and fit in timer ticks",
                v
            ),
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {} mm/s². Must be > 0", v)
            }
            ConfigError::InvalidMinInterval(v) => {
                write!(f, "Invalid minimum step interval: {} ticks. Must be > 0", v)
            }
            ConfigError::InvalidMaxFeedrate(axis) => {
                write!(f, "Axis {} is enabled but has no maximum feedrate", axis)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::EmptyMove => write!(f, "Move has no steps on any axis"),
            PlanError::AxisDisabled(axis) => {
                write!(f, "Move requests steps on disabled axis {}", axis)
            }
            PlanError::Overflow => write!(f, "Target position overflows step range"),
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::RampDirection { step, ramp_n } => write!(
                f,
                "Ramp counter {} inconsistent with ramp phase at step {}",
                ramp_n, step
            ),
            StepError::PinError => write!(f, "GPIO pin operation failed"),
        }
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Full => write!(f, "Move queue is full"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<PlanError> for Error {
    fn from(e: PlanError) -> Self {
        Error::Plan(e)
    }
}

impl From<StepError> for Error {
    fn from(e: StepError) -> Self {
        Error::Step(e)
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Error::Queue(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for PlanError {}

#[cfg(feature = "std")]
impl std::error::Error for StepError {}

#[cfg(feature = "std")]
impl std::error::Error for QueueError {}
