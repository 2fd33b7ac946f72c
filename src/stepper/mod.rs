//! Stepper module for dda-motion.
//!
//! The two execution contexts and what they share: the step handler
//! ([`Stepper`]), the clock handler ([`ClockHandler`]), the cross-context
//! state ([`MotionShared`]) and the collaborators both talk to.

mod clock;
mod driver;
mod endstop;
mod queue;
mod shared;
mod state;
mod step;
mod timer;

pub use clock::{ClockHandler, TickOutcome};
pub use driver::{AxisDriver, AxisDrivers, Direction};
pub use endstop::{EndstopInputs, EndstopPins, NoEndstops};
pub use queue::{MoveQueue, MoveRing};
pub use shared::{ActiveMove, BusyGuard, Diagnostics, MotionShared, MotionSnapshot, NestingHooks, Pacing};
pub use state::MoveState;
pub use step::{StepOutcome, Stepper};
pub use timer::StepTimer;
