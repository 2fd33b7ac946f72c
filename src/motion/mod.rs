//! Motion module for dda-motion.
//!
//! Move planning, speed models and the integer rate arithmetic shared with
//! the execution contexts.

pub mod clock_law;
pub mod dda;
pub mod fixed;
pub mod lookahead;
pub mod ramp;
pub mod strategy;
pub mod temporal;

pub use clock_law::{completion_skew, ClockInputs, ClockPlan, Skew};
pub use dda::{Dda, MoveId, MoveRequest, Planner};
pub use lookahead::{CrossingSpeed, Join, Joiner};
pub use ramp::{RampPlan, RampState};
pub use strategy::{MotionPhase, SpeedModel, SpeedPlan};
pub use temporal::TemporalPlan;
