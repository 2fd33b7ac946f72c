//! Progress through the current move.
//!
//! Owned by the step handler and reset on every activation.

use crate::config::{Axis, AxisMask, NUM_AXES};
use crate::motion::{Dda, RampState, SpeedModel, TemporalPlan};

/// Step-handler state of the current move.
#[derive(Debug, Clone, Copy)]
pub struct MoveState {
    /// Move being executed.
    pub dda: Dda,
    /// Dominant-axis steps taken.
    pub step_no: u32,
    /// Steps taken per axis.
    pub axis_steps: [u32; NUM_AXES],
    /// Interval armed before the next step.
    pub interval: u32,
    /// Ramp counter, for step-synchronous moves.
    pub ramp: RampState,
    accumulators: [u64; NUM_AXES],
    next_due: [u64; NUM_AXES],
    now: u64,
}

impl MoveState {
    /// Fresh state at the start of `dda`.
    pub fn new(dda: Dda) -> Self {
        let total = dda.total_steps as u64;
        let mut next_due = [0u64; NUM_AXES];
        if let Some(plan) = dda.plan.temporal() {
            for (due, &interval) in next_due.iter_mut().zip(plan.axis_interval.iter()) {
                *due = interval as u64;
            }
        }

        Self {
            dda,
            step_no: 0,
            axis_steps: [0; NUM_AXES],
            interval: dda.plan.initial_interval(),
            ramp: dda.plan.ramp().map(|r| r.initial_state()).unwrap_or_default(),
            accumulators: [total / 2; NUM_AXES],
            next_due,
            now: 0,
        }
    }

    /// Advance the Bresenham accumulators by one dominant-axis step and
    /// return the axes that step.
    pub fn bresenham_step(&mut self) -> AxisMask {
        let total = self.dda.total_steps as u64;
        let mut mask = AxisMask::NONE;
        for axis in Axis::ALL {
            let i = axis.index();
            let d = self.dda.axis_steps(axis) as u64;
            if d == 0 {
                continue;
            }
            self.accumulators[i] += d;
            if self.accumulators[i] >= total {
                self.accumulators[i] -= total;
                self.axis_steps[i] += 1;
                mask = mask.with(axis);
            }
        }
        self.step_no += 1;
        mask
    }

    /// Advance the per-axis clocks by the interval that just elapsed and
    /// return the axes that are due, plus the interval until the next one.
    pub fn temporal_step(&mut self, plan: &TemporalPlan) -> (AxisMask, Option<u32>) {
        self.now += self.interval as u64;

        let mut mask = AxisMask::NONE;
        let mut next: Option<u64> = None;
        for axis in Axis::ALL {
            let i = axis.index();
            let remaining = self.dda.axis_steps(axis) - self.axis_steps[i];
            if remaining == 0 {
                continue;
            }
            if self.next_due[i] <= self.now {
                self.next_due[i] += plan.axis_interval[i] as u64;
                self.axis_steps[i] += 1;
                mask = mask.with(axis);
                if remaining == 1 {
                    continue;
                }
            }
            next = Some(next.map_or(self.next_due[i], |n| n.min(self.next_due[i])));
        }

        let dominant = self
            .dda
            .moving_axes()
            .iter()
            .max_by_key(|a| self.dda.axis_steps(*a));
        if let Some(axis) = dominant {
            self.step_no = self.axis_steps[axis.index()];
        }

        let interval = next.map(|due| (due.saturating_sub(self.now)).clamp(1, u32::MAX as u64) as u32);
        (mask, interval)
    }

    /// Every axis has taken all of its steps.
    pub fn is_complete(&self) -> bool {
        Axis::ALL
            .into_iter()
            .all(|a| self.axis_steps[a.index()] >= self.dda.axis_steps(a))
    }
}
