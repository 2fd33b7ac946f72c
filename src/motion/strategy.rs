//! Speed-model strategy.
//!
//! One strategy is active per machine. It decides where a move's speed is
//! recomputed (per step or per clock tick) and how (ramp recurrence or
//! velocity-time law). The step and clock handlers only ever talk to
//! [`SpeedModel`].

use crate::config::{MachineConstraints, StrategyKind, NUM_AXES};
use crate::error::StepError;

use super::clock_law::{ClockInputs, ClockPlan};
use super::ramp::{RampInputs, RampPlan, RampState};
use super::temporal::TemporalPlan;

/// Current phase of motion execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Accelerating toward cruise speed.
    Accelerating,
    /// Moving at constant cruise speed.
    Cruising,
    /// Decelerating toward the end speed.
    Decelerating,
    /// Motion complete.
    Complete,
}

/// Operations the execution contexts need from a speed model.
pub trait SpeedModel {
    /// Interval armed for the first step of the move.
    fn initial_interval(&self) -> u32;

    /// Step-synchronous recomputation after `step_no` steps, given the
    /// interval `current` that preceded the step.
    ///
    /// `Ok(None)` keeps the current interval.
    fn after_step(
        &self,
        _step_no: u32,
        _current: u32,
        _ramp: &mut RampState,
    ) -> Result<Option<u32>, StepError> {
        Ok(None)
    }

    /// Clock-synchronous phase and interval after `elapsed` clock ticks.
    ///
    /// `None` means this model does not recompute on the clock.
    fn at_tick(&self, _elapsed: u32) -> Option<(MotionPhase, u32)> {
        None
    }
}

impl SpeedModel for RampPlan {
    fn initial_interval(&self) -> u32 {
        self.c_initial
    }

    fn after_step(
        &self,
        step_no: u32,
        current: u32,
        ramp: &mut RampState,
    ) -> Result<Option<u32>, StepError> {
        self.next_interval(step_no, current, ramp)
    }
}

impl SpeedModel for ClockPlan {
    fn initial_interval(&self) -> u32 {
        ClockPlan::initial_interval(self)
    }

    fn at_tick(&self, elapsed: u32) -> Option<(MotionPhase, u32)> {
        Some(self.interval_at(elapsed))
    }
}

impl SpeedModel for TemporalPlan {
    fn initial_interval(&self) -> u32 {
        TemporalPlan::initial_interval(self)
    }
}

/// Speed envelope and geometry a plan is computed from.
#[derive(Debug, Clone, Copy)]
pub struct PlanInputs {
    /// Absolute steps per axis.
    pub axis_steps: [u32; NUM_AXES],
    /// Dominant-axis step count.
    pub total_steps: u32,
    /// Length of the move.
    pub distance_um: u32,
    /// Speed-to-interval constant.
    pub rate_const: u64,
    /// Start speed, mm/min.
    pub start: u32,
    /// Cruise speed, mm/min.
    pub cruise: u32,
    /// End speed, mm/min.
    pub end: u32,
}

/// The per-move plan of the active strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedPlan {
    /// Step-synchronous ramps.
    Ramp(RampPlan),
    /// Clock-synchronous velocity law.
    Clock(ClockPlan),
    /// Independent per-axis timing.
    Temporal(TemporalPlan),
}

impl SpeedPlan {
    /// Compute the plan of a move for the configured strategy.
    pub fn new(c: &MachineConstraints, m: &PlanInputs) -> Self {
        match c.strategy {
            StrategyKind::Ramping => SpeedPlan::Ramp(RampPlan::new(&RampInputs {
                total_steps: m.total_steps,
                distance_um: m.distance_um,
                rate_const: m.rate_const,
                start: m.start,
                cruise: m.cruise,
                end: m.end,
                acceleration_mm_per_s2: c.acceleration_mm_per_s2,
                timer_hz: c.timer_hz,
            })),
            StrategyKind::Clock => SpeedPlan::Clock(ClockPlan::new(&ClockInputs {
                rate_const: m.rate_const,
                area: ClockInputs::area_of(m.rate_const, m.total_steps, c.ticks_per_clock),
                start: m.start,
                cruise: m.cruise,
                end: m.end,
                accel_per_tick: c.accel_per_clock,
                min_speed: ClockInputs::step_per_tick_speed(m.rate_const, c.ticks_per_clock),
            })),
            StrategyKind::Temporal => SpeedPlan::Temporal(TemporalPlan::new(
                m.axis_steps,
                m.distance_um,
                m.cruise,
                c.timer_hz,
            )),
        }
    }

    /// The clock plan, if this is a clock-synchronous move.
    pub fn clock(&self) -> Option<&ClockPlan> {
        match self {
            SpeedPlan::Clock(plan) => Some(plan),
            _ => None,
        }
    }

    /// The ramp plan, if this is a step-synchronous move.
    pub fn ramp(&self) -> Option<&RampPlan> {
        match self {
            SpeedPlan::Ramp(plan) => Some(plan),
            _ => None,
        }
    }

    /// The per-axis schedule, if this is a time-per-axis move.
    pub fn temporal(&self) -> Option<&TemporalPlan> {
        match self {
            SpeedPlan::Temporal(plan) => Some(plan),
            _ => None,
        }
    }
}

impl SpeedModel for SpeedPlan {
    fn initial_interval(&self) -> u32 {
        match self {
            SpeedPlan::Ramp(p) => SpeedModel::initial_interval(p),
            SpeedPlan::Clock(p) => SpeedModel::initial_interval(p),
            SpeedPlan::Temporal(p) => SpeedModel::initial_interval(p),
        }
    }

    fn after_step(
        &self,
        step_no: u32,
        current: u32,
        ramp: &mut RampState,
    ) -> Result<Option<u32>, StepError> {
        match self {
            SpeedPlan::Ramp(p) => p.after_step(step_no, current, ramp),
            SpeedPlan::Clock(p) => p.after_step(step_no, current, ramp),
            SpeedPlan::Temporal(p) => p.after_step(step_no, current, ramp),
        }
    }

    fn at_tick(&self, elapsed: u32) -> Option<(MotionPhase, u32)> {
        match self {
            SpeedPlan::Ramp(p) => p.at_tick(elapsed),
            SpeedPlan::Clock(p) => p.at_tick(elapsed),
            SpeedPlan::Temporal(p) => p.at_tick(elapsed),
        }
    }
}
