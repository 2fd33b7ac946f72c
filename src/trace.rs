//! Diagnostic trace events.
//!
//! Both execution contexts report what they do through [`emit`]. Events are
//! dropped unless the debug flag on [`MotionShared`] is set, except ramp
//! faults which are always reported. Output goes through the `log` facade,
//! or through `defmt` when that feature is enabled; either way the call never
//! waits on the sink.

use crate::config::Axis;
use crate::motion::{MotionPhase, MoveId};
use crate::stepper::MotionShared;

/// Something worth reporting from a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TraceEvent {
    /// A move became current.
    MoveStarted {
        /// Move id.
        id: MoveId,
        /// Dominant-axis steps.
        total_steps: u32,
        /// First armed interval.
        interval: u32,
    },
    /// The clock law entered a new phase.
    Phase {
        /// Move id.
        id: MoveId,
        /// New phase.
        phase: MotionPhase,
        /// Elapsed clock ticks.
        elapsed: u32,
    },
    /// Interval armed after a step.
    Interval {
        /// Step number.
        step: u32,
        /// Armed interval in timer ticks.
        ticks: u32,
    },
    /// The clock handler pulled the step timer in.
    LagRearm {
        /// Clock ticks since the last step.
        since_step: u32,
        /// Rearmed interval in timer ticks.
        ticks: u32,
    },
    /// Move finished early against its planned duration.
    Undershoot {
        /// Move id.
        id: MoveId,
        /// Ticks early.
        ticks: u32,
    },
    /// Move finished late against its planned duration.
    Overshoot {
        /// Move id.
        id: MoveId,
        /// Ticks late.
        ticks: u32,
    },
    /// An endstop confirmed a trigger.
    Endstop {
        /// Move id.
        id: MoveId,
        /// Triggering axis.
        axis: Axis,
    },
    /// Clock handler invoked while still busy.
    Reentry,
    /// Ramp counter contradicted the ramp phase; the move was aborted.
    RampFault {
        /// Move id.
        id: MoveId,
        /// Step number.
        step: u32,
        /// Ramp counter.
        ramp_n: i32,
    },
    /// A move finished.
    MoveCompleted {
        /// Move id.
        id: MoveId,
        /// Dominant-axis steps actually taken.
        steps: u32,
        /// Ended by an endstop.
        truncated: bool,
    },
}

impl TraceEvent {
    fn always(&self) -> bool {
        matches!(self, TraceEvent::RampFault { .. })
    }
}

/// Report an event if tracing is enabled.
#[inline]
pub fn emit(shared: &MotionShared, event: TraceEvent) {
    if !event.always() && !shared.debug() {
        return;
    }
    sink(&event);
}

#[cfg(not(feature = "defmt"))]
fn sink(event: &TraceEvent) {
    match event {
        TraceEvent::RampFault { .. } => log::error!("{:?}", event),
        TraceEvent::Undershoot { .. } | TraceEvent::Overshoot { .. } | TraceEvent::Reentry => {
            log::warn!("{:?}", event)
        }
        TraceEvent::Interval { .. } | TraceEvent::LagRearm { .. } => log::trace!("{:?}", event),
        _ => log::debug!("{:?}", event),
    }
}

#[cfg(feature = "defmt")]
fn sink(event: &TraceEvent) {
    match event {
        TraceEvent::RampFault { .. } => defmt::error!("{}", event),
        TraceEvent::Undershoot { .. } | TraceEvent::Overshoot { .. } | TraceEvent::Reentry => {
            defmt::warn!("{}", event)
        }
        TraceEvent::Interval { .. } | TraceEvent::LagRearm { .. } => defmt::trace!("{}", event),
        _ => defmt::debug!("{}", event),
    }
}
