//! Clock handler.
//!
//! Runs on a fixed period. It advances the current move's clock, debounces
//! endstops, evaluates the velocity law of clock-synchronous moves and pulls
//! in the step timer when stepping has fallen behind that law.

use crate::config::{MachineConstraints, TimerTicks, NUM_AXES};
use crate::motion::{MotionPhase, MoveId, SpeedModel};
use crate::trace::{emit, TraceEvent};

use super::endstop::EndstopInputs;
use super::shared::{ActiveMove, MotionShared};
use super::timer::StepTimer;

/// What one clock-handler invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A previous invocation still held the busy flag; nothing was touched.
    Busy,
    /// No current move.
    Idle,
    /// The current move's clock advanced.
    Ticked {
        /// Clock ticks since the move started.
        elapsed: u32,
        /// Interval written for the step handler, if it changed.
        interval: Option<u32>,
        /// Step timer rearm, if stepping had fallen behind.
        rearmed: Option<u32>,
    },
}

/// Clock-context half of the motion core.
pub struct ClockHandler<E: EndstopInputs> {
    constraints: MachineConstraints,
    endstops: E,
    debounce: [u8; NUM_AXES],
    move_id: Option<MoveId>,
    phase: Option<MotionPhase>,
}

impl<E: EndstopInputs> ClockHandler<E> {
    /// Clock handler sampling `endstops`.
    pub fn new(constraints: MachineConstraints, endstops: E) -> Self {
        Self {
            constraints,
            endstops,
            debounce: [0; NUM_AXES],
            move_id: None,
            phase: None,
        }
    }

    /// Endstop inputs.
    pub fn endstops(&mut self) -> &mut E {
        &mut self.endstops
    }

    /// Handle one clock period.
    pub fn on_tick<T: StepTimer>(&mut self, shared: &MotionShared, timer: &T) -> TickOutcome {
        let Some(guard) = shared.try_enter_clock() else {
            shared.count(|d| d.reentries += 1);
            emit(shared, TraceEvent::Reentry);
            return TickOutcome::Busy;
        };

        let Some(active) = shared.active() else {
            self.move_id = None;
            return TickOutcome::Idle;
        };
        if self.move_id != Some(active.id) {
            self.move_id = Some(active.id);
            self.phase = None;
            self.debounce = [0; NUM_AXES];
        }

        let elapsed = shared.advance_clock(active.id);
        self.sample_endstops(shared, &active);

        let Some(plan) = active.clock else {
            return TickOutcome::Ticked {
                elapsed,
                interval: None,
                rearmed: None,
            };
        };

        let (phase, interval) = guard.preemptible(|| plan.at_tick(elapsed)).unwrap_or((MotionPhase::Cruising, 0));

        let latched = phase == MotionPhase::Cruising && self.phase == Some(MotionPhase::Cruising);
        if self.phase != Some(phase) {
            self.phase = Some(phase);
            emit(
                shared,
                TraceEvent::Phase {
                    id: active.id,
                    phase,
                    elapsed,
                },
            );
        }
        if latched || interval == 0 {
            return TickOutcome::Ticked {
                elapsed,
                interval: None,
                rearmed: None,
            };
        }

        // A step may have landed while the window was open: the pacing read,
        // the interval write and the rearm happen together.
        let interval = self.constraints.clamp_interval(interval);
        let update = shared.with_pacing(|pacing| {
            if pacing.interval == interval {
                return None;
            }
            let rearm = self.compensate(pacing.interval, interval, pacing.since_step);
            pacing.interval = interval;
            if let Some((ticks, _)) = rearm {
                timer.arm(TimerTicks(ticks));
            }
            Some((rearm, pacing.since_step))
        });
        let Some((rearmed, since_step)) = update else {
            return TickOutcome::Ticked {
                elapsed,
                interval: None,
                rearmed: None,
            };
        };

        if let Some((ticks, clamped)) = rearmed {
            shared.count(|d| {
                d.lag_rearms += 1;
                if clamped {
                    d.lag_clamped += 1;
                }
            });
            emit(shared, TraceEvent::LagRearm { since_step, ticks });
        }

        TickOutcome::Ticked {
            elapsed,
            interval: Some(interval),
            rearmed: rearmed.map(|(ticks, _)| ticks),
        }
    }

    fn sample_endstops(&mut self, shared: &MotionShared, active: &ActiveMove) {
        for axis in active.endstops.iter() {
            let count = &mut self.debounce[axis.index()];
            if self.endstops.is_triggered(axis) {
                *count = count.saturating_add(1);
            } else {
                *count = 0;
            }
            if *count == self.constraints.endstop_debounce {
                shared.request_stop(active.id);
                emit(shared, TraceEvent::Endstop { id: active.id, axis });
            }
        }
    }

    /// Rearm of the step timer when the new interval is due well before the
    /// armed one; `(ticks, clamped_to_minimum)`.
    ///
    /// `since_step` only resolves whole clock periods, so time since the last
    /// step lies in `[(since_step - 1) * p, since_step * p]`. A `since_step`
    /// of 0 is a step taken during this invocation, less than a period ago.
    /// Rearming only happens when the new deadline is earlier than the old
    /// one for every point of that range, which means a rearm can never
    /// delay a step.
    fn compensate(&self, armed: u32, interval: u32, since_step: u32) -> Option<(u32, bool)> {
        let period = self.constraints.ticks_per_clock as u64;
        let lag_min = since_step.saturating_sub(1) as u64 * period;
        let lag_max = since_step.max(1) as u64 * period;

        let pending_min = (armed as u64).saturating_sub(lag_max);
        let wanted = (interval as u64).saturating_sub(lag_min);
        if wanted >= pending_min {
            return None;
        }

        let min = self.constraints.min_interval.0 as u64;
        if wanted < min {
            Some((min as u32, true))
        } else {
            Some((wanted.min(u32::MAX as u64) as u32, false))
        }
    }
}
