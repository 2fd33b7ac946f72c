//! # dda-motion
//!
//! Integer DDA motion core for stepper-driven machines, with embedded-hal 1.0
//! support.
//!
//! ## Features
//!
//! - **Bresenham stepping**: every axis gets exactly its planned step count
//! - **Three speed models**: step-synchronous ramps, a clock-synchronous
//!   velocity law, or independent per-axis timing, picked in configuration
//! - **Two execution contexts**: a step handler and a fixed-period clock
//!   handler sharing state through critical sections only
//! - **Stall compensation**: the clock handler pulls in the step timer when
//!   stepping falls behind the velocity law
//! - **Look-ahead joining**: adjacent moves share a max-jerk corner speed
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dda_motion::{MachineConstraints, MotionShared, MoveRequest, MoveRing, Planner};
//!
//! static SHARED: MotionShared = MotionShared::new();
//!
//! let config = dda_motion::load_config("machine.toml")?;
//! let constraints = MachineConstraints::from_config(&config);
//!
//! let mut planner = Planner::new(constraints);
//! let mut queue: MoveRing<16> = MoveRing::new(constraints);
//! let dda = planner.plan(&MoveRequest::new(target, feedrate), queue.last())?;
//! queue.enqueue(dda)?;
//!
//! // step timer interrupt
//! stepper.service(&mut queue, &SHARED, &timer)?;
//!
//! // clock interrupt
//! clock.on_tick(&SHARED, &timer);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `defmt`: Routes trace output through defmt instead of log

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod error;
pub mod motion;
pub mod stepper;
pub mod trace;

// Re-exports for ergonomic API
pub use config::{validate_config, Axis, AxisMask, MachineConfig, MachineConstraints, StrategyKind};
pub use error::{Error, Result};
pub use motion::{Dda, MotionPhase, MoveId, MoveRequest, Planner, SpeedPlan};
pub use stepper::{
    ClockHandler, Diagnostics, MotionShared, MoveQueue, MoveRing, StepOutcome, StepTimer, Stepper,
    TickOutcome,
};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{ClockTicks, Micrometers, MmPerMinute, Steps, StepsPerMeter, TimerTicks};
