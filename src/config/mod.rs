//! Configuration module for dda-motion.
//!
//! Provides types for loading and validating the machine configuration
//! from TOML files (with `std` feature) or pre-parsed data.

mod axis;
#[cfg(feature = "std")]
mod loader;
mod machine;
mod mechanical;
pub mod units;
mod validation;

pub use axis::{AxesConfig, Axis, AxisConfig, AxisMask, NUM_AXES};
pub use machine::{MachineConfig, MotionConfig, StrategyKind};
pub use mechanical::MachineConstraints;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{ClockTicks, Micrometers, MmPerMinute, Steps, StepsPerMeter, TimerTicks};
