//! Step handler.
//!
//! Runs on every step-timer expiry. It owns the axis progress counters and
//! the only path that ends a move: natural completion, an endstop stop
//! requested by the clock handler, or an aborted ramp.

use embedded_hal::digital::OutputPin;

use crate::config::{Axis, AxisMask, MachineConstraints, Steps, TimerTicks, NUM_AXES};
use crate::error::{Error, PlanError, Result, StepError};
use crate::motion::{completion_skew, Dda, MoveId, Skew, SpeedModel, SpeedPlan};
use crate::trace::{emit, TraceEvent};

use super::driver::{AxisDrivers, Direction};
use super::queue::MoveQueue;
use super::shared::{ActiveMove, MotionShared};
use super::state::MoveState;
use super::timer::StepTimer;

/// What one step-handler invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No current move.
    Idle,
    /// Axes stepped and the timer was rearmed.
    Stepped {
        /// Axes that received a pulse.
        axes: AxisMask,
        /// Armed interval in timer ticks.
        interval: u32,
    },
    /// The current move ended.
    Completed {
        /// Finished move.
        id: MoveId,
        /// Ended early by an endstop.
        truncated: bool,
        /// Timing against plan, for clock-synchronous moves.
        skew: Option<Skew>,
    },
}

/// Step-context half of the motion core.
pub struct Stepper<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    constraints: MachineConstraints,
    drivers: AxisDrivers<STEP, DIR>,
    current: Option<MoveState>,
}

impl<STEP, DIR> Stepper<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// Idle step handler over the given axis drivers.
    pub fn new(constraints: MachineConstraints, drivers: AxisDrivers<STEP, DIR>) -> Self {
        Self {
            constraints,
            drivers,
            current: None,
        }
    }

    /// Whether no move is current.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Current move.
    pub fn current(&self) -> Option<&Dda> {
        self.current.as_ref().map(|s| &s.dda)
    }

    /// Progress through the current move.
    pub fn state(&self) -> Option<&MoveState> {
        self.current.as_ref()
    }

    /// Absolute position of every axis.
    pub fn position(&self) -> [Steps; NUM_AXES] {
        self.drivers.positions()
    }

    /// Steps taken on `axis` in the current move.
    pub fn axis_progress(&self, axis: Axis) -> u32 {
        self.current
            .as_ref()
            .map_or(0, |s| s.axis_steps[axis.index()])
    }

    /// Axis drivers.
    pub fn drivers(&self) -> &AxisDrivers<STEP, DIR> {
        &self.drivers
    }

    /// Give the axis drivers back.
    pub fn release(self) -> AxisDrivers<STEP, DIR> {
        self.drivers
    }

    /// Make `dda` the current move and arm its first step.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::AxisDisabled`] if the move steps an axis without
    /// a driver, or [`StepError::PinError`] if a DIR pin fails.
    pub fn start<T: StepTimer>(&mut self, dda: Dda, shared: &MotionShared, timer: &T) -> Result<()> {
        for axis in dda.moving_axes().iter() {
            let driver = self
                .drivers
                .get_mut(axis)
                .ok_or(PlanError::AxisDisabled(axis))?;
            driver.set_direction(Direction::of(dda.delta[axis.index()]))?;
        }

        let mut state = MoveState::new(dda);
        let armed = self.constraints.clamp_interval(state.interval);
        if dda.plan.temporal().is_some() {
            state.interval = armed;
        }
        let active = ActiveMove {
            id: dda.id,
            endstops: dda.endstops,
            clock: dda.plan.clock().copied(),
        };

        shared.begin_move(active, state.interval);
        self.current = Some(state);
        timer.arm(TimerTicks(armed));

        emit(
            shared,
            TraceEvent::MoveStarted {
                id: dda.id,
                total_steps: dda.total_steps,
                interval: armed,
            },
        );
        Ok(())
    }

    /// Pull the next move from `queue` and start it, or disarm the timer if
    /// there is none. Returns the id of the started move.
    ///
    /// # Errors
    ///
    /// See [`Stepper::start`].
    pub fn activate_next<Q, T>(
        &mut self,
        queue: &mut Q,
        shared: &MotionShared,
        timer: &T,
    ) -> Result<Option<MoveId>>
    where
        Q: MoveQueue,
        T: StepTimer,
    {
        match queue.next_move() {
            Some(dda) => {
                let id = dda.id;
                self.start(dda, shared, timer)?;
                Ok(Some(id))
            }
            None => {
                timer.disarm();
                Ok(None)
            }
        }
    }

    /// Handle one step-timer expiry.
    ///
    /// # Errors
    ///
    /// - [`StepError::RampDirection`] if the ramp counter went the wrong way;
    ///   the move is aborted and the handler is idle afterwards
    /// - [`StepError::PinError`] if a STEP pin fails
    pub fn on_step<T: StepTimer>(&mut self, shared: &MotionShared, timer: &T) -> Result<StepOutcome> {
        let Some(state) = self.current.as_mut() else {
            return Ok(StepOutcome::Idle);
        };

        if shared.stop_requested(state.dda.id) {
            return Ok(self.finish(shared, true));
        }

        let temporal = state.dda.plan.temporal().copied();
        let (axes, next) = match temporal {
            Some(plan) => state.temporal_step(&plan),
            None => (state.bresenham_step(), None),
        };

        for axis in axes.iter() {
            if let Some(driver) = self.drivers.get_mut(axis) {
                driver.pulse()?;
            }
        }
        shared.mark_step();

        if state.is_complete() {
            return Ok(self.finish(shared, false));
        }

        let interval = match &state.dda.plan {
            SpeedPlan::Ramp(plan) => {
                match plan.after_step(state.step_no, state.interval, &mut state.ramp) {
                    Ok(Some(c)) => c,
                    Ok(None) => state.interval,
                    Err(e) => return Err(self.abort(shared, e)),
                }
            }
            SpeedPlan::Clock(_) => shared.interval(),
            SpeedPlan::Temporal(_) => next.unwrap_or(state.interval),
        };

        let armed = self.constraints.clamp_interval(interval);
        state.interval = match state.dda.plan {
            // the clock handler owns the interval of clock moves
            SpeedPlan::Clock(_) => interval,
            SpeedPlan::Temporal(_) => armed,
            SpeedPlan::Ramp(_) => {
                shared.set_interval(interval);
                interval
            }
        };
        timer.arm(TimerTicks(armed));

        emit(
            shared,
            TraceEvent::Interval {
                step: state.step_no,
                ticks: armed,
            },
        );
        Ok(StepOutcome::Stepped {
            axes,
            interval: armed,
        })
    }

    /// Handle one step-timer expiry and, when a move ends, report it to the
    /// queue and start the next one.
    ///
    /// # Errors
    ///
    /// See [`Stepper::on_step`] and [`Stepper::start`].
    pub fn service<Q, T>(&mut self, queue: &mut Q, shared: &MotionShared, timer: &T) -> Result<StepOutcome>
    where
        Q: MoveQueue,
        T: StepTimer,
    {
        let outcome = self.on_step(shared, timer)?;
        match outcome {
            StepOutcome::Completed { id, .. } => {
                queue.on_complete(id);
                self.activate_next(queue, shared, timer)?;
            }
            StepOutcome::Idle => {
                self.activate_next(queue, shared, timer)?;
            }
            StepOutcome::Stepped { .. } => {}
        }
        Ok(outcome)
    }

    fn finish(&mut self, shared: &MotionShared, truncated: bool) -> StepOutcome {
        let Some(state) = self.current.take() else {
            return StepOutcome::Idle;
        };
        let id = state.dda.id;

        let skew = match (state.dda.plan.clock(), truncated) {
            (Some(plan), false) => Some(completion_skew(plan.total_ticks, shared.elapsed(id).0)),
            _ => None,
        };
        match skew {
            Some(Skew::Undershoot(ticks)) => {
                shared.count(|d| d.undershoots += 1);
                emit(shared, TraceEvent::Undershoot { id, ticks });
            }
            Some(Skew::Overshoot(ticks)) => {
                shared.count(|d| d.overshoots += 1);
                emit(shared, TraceEvent::Overshoot { id, ticks });
            }
            _ => {}
        }

        shared.count(|d| {
            d.moves_completed += 1;
            if truncated {
                d.endstop_stops += 1;
            }
        });
        shared.end_move();

        emit(
            shared,
            TraceEvent::MoveCompleted {
                id,
                steps: state.step_no,
                truncated,
            },
        );
        StepOutcome::Completed { id, truncated, skew }
    }

    fn abort(&mut self, shared: &MotionShared, error: StepError) -> Error {
        if let Some(state) = self.current.take() {
            if let StepError::RampDirection { step, ramp_n } = &error {
                emit(
                    shared,
                    TraceEvent::RampFault {
                        id: state.dda.id,
                        step: *step,
                        ramp_n: *ramp_n,
                    },
                );
            }
        }
        shared.count(|d| d.ramp_faults += 1);
        shared.end_move();
        error.into()
    }
}
