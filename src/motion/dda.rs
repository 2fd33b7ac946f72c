//! Move descriptors and the planning entry point.
//!
//! A [`Dda`] is created once per move by [`Planner::plan`] and does not change
//! afterwards, except that look-ahead may rewrite its edge speeds while it is
//! still queued.

use crate::config::{
    Axis, AxisMask, MachineConstraints, Micrometers, MmPerMinute, Steps, StrategyKind, NUM_AXES,
};
use crate::error::{PlanError, Result};

use super::fixed::{distance, duration_ticks, rate_const, reachable_speed, speed_for_duration};
use super::lookahead::{CrossingSpeed, Join, Joiner};
use super::strategy::{PlanInputs, SpeedPlan};

/// Identifier of a planned move. Wraps around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveId(pub u16);

impl MoveId {
    /// The id following this one.
    #[inline]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A requested linear move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRequest {
    /// Absolute target per axis.
    pub target: [Micrometers; NUM_AXES],
    /// Requested feedrate along the move.
    pub feedrate: MmPerMinute,
    /// Axes whose endstops end the move early.
    pub endstops: AxisMask,
}

impl MoveRequest {
    /// Move to `target` at `feedrate`.
    pub fn new(target: [Micrometers; NUM_AXES], feedrate: MmPerMinute) -> Self {
        Self {
            target,
            feedrate,
            endstops: AxisMask::NONE,
        }
    }

    /// Stop the move when one of these axes' endstops triggers.
    pub fn with_endstops(mut self, endstops: AxisMask) -> Self {
        self.endstops = endstops;
        self
    }
}

/// Immutable plan of one move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dda {
    /// Move identifier.
    pub id: MoveId,
    /// Signed steps per axis.
    pub delta: [Steps; NUM_AXES],
    /// Signed distance per axis.
    pub delta_um: [i32; NUM_AXES],
    /// Dominant-axis step count.
    pub total_steps: u32,
    /// Length of the move.
    pub distance_um: u32,
    /// Speed at the first step.
    pub start_rate: MmPerMinute,
    /// Cruise speed.
    pub cruise_rate: MmPerMinute,
    /// Speed at the last step.
    pub end_rate: MmPerMinute,
    /// Speed-to-interval constant; see [`crate::motion::fixed`].
    pub rate_const: u64,
    /// Duration at cruise speed without ramps, in clock ticks.
    pub cruise_ticks: u32,
    /// Axes whose endstops end the move early.
    pub endstops: AxisMask,
    /// Speed plan of the active strategy.
    pub plan: SpeedPlan,
    /// Look-ahead link to the previous move.
    pub join: Option<Join>,
}

impl Dda {
    /// Absolute steps of an axis.
    #[inline]
    pub fn axis_steps(&self, axis: Axis) -> u32 {
        self.delta[axis.index()].abs()
    }

    /// Axes with at least one step.
    pub fn moving_axes(&self) -> AxisMask {
        Axis::ALL
            .into_iter()
            .filter(|a| self.delta[a.index()].0 != 0)
            .fold(AxisMask::NONE, AxisMask::with)
    }

    /// Replace the start speed and recompute the plan.
    pub fn set_start_rate(&mut self, rate: MmPerMinute, c: &MachineConstraints) {
        self.start_rate = rate;
        self.replan(c);
    }

    /// Replace the end speed and recompute the plan.
    pub fn set_end_rate(&mut self, rate: MmPerMinute, c: &MachineConstraints) {
        self.end_rate = rate;
        self.replan(c);
    }

    fn replan(&mut self, c: &MachineConstraints) {
        self.start_rate = self.start_rate.min(self.cruise_rate);
        self.end_rate = self.end_rate.min(self.cruise_rate);
        self.plan = SpeedPlan::new(c, &self.plan_inputs());
    }

    fn plan_inputs(&self) -> PlanInputs {
        PlanInputs {
            axis_steps: self.delta.map(|d| d.abs()),
            total_steps: self.total_steps,
            distance_um: self.distance_um,
            rate_const: self.rate_const,
            start: self.start_rate.0,
            cruise: self.cruise_rate.0,
            end: self.end_rate.0,
        }
    }
}

/// Turns move requests into move descriptors.
///
/// Tracks the planned position, which runs ahead of the executed one by the
/// length of the move queue.
#[derive(Debug, Clone)]
pub struct Planner {
    constraints: MachineConstraints,
    position_um: [Micrometers; NUM_AXES],
    position: [Steps; NUM_AXES],
    next_id: MoveId,
    joiner: CrossingSpeed,
}

impl Planner {
    /// Create a planner at the origin.
    pub fn new(constraints: MachineConstraints) -> Self {
        Self {
            joiner: CrossingSpeed::new(constraints.max_jerk),
            constraints,
            position_um: [Micrometers::default(); NUM_AXES],
            position: [Steps::default(); NUM_AXES],
            next_id: MoveId::default(),
        }
    }

    /// Machine constraints used for planning.
    pub fn constraints(&self) -> &MachineConstraints {
        &self.constraints
    }

    /// Planned position.
    pub fn position(&self) -> [Micrometers; NUM_AXES] {
        self.position_um
    }

    /// Planned position in steps.
    pub fn position_steps(&self) -> [Steps; NUM_AXES] {
        self.position
    }

    /// Redefine the planned position, e.g. after homing.
    ///
    /// A move cut short by an endstop leaves the planner at the target it
    /// planned for. Call this, or [`Planner::sync_steps`], once the queue
    /// has drained and before planning the next move.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Overflow`] if a coordinate cannot be expressed in
    /// steps.
    pub fn set_position(&mut self, position: [Micrometers; NUM_AXES]) -> Result<()> {
        let mut steps = [Steps::default(); NUM_AXES];
        for axis in Axis::ALL {
            let i = axis.index();
            steps[i] = position[i]
                .to_steps(self.constraints.steps_per_m[i])
                .ok_or(PlanError::Overflow)?;
        }
        self.position_um = position;
        self.position = steps;
        Ok(())
    }

    /// Take over the executed position, e.g. [`Stepper::position`] after an
    /// endstop stop.
    ///
    /// Disabled axes keep their planned position.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Overflow`] if a position cannot be expressed in
    /// micrometers.
    ///
    /// [`Stepper::position`]: crate::stepper::Stepper::position
    pub fn sync_steps(&mut self, steps: [Steps; NUM_AXES]) -> Result<()> {
        let mut position_um = self.position_um;
        let mut position = self.position;
        for axis in Axis::ALL.into_iter().filter(|&a| self.constraints.axis_enabled(a)) {
            let i = axis.index();
            position_um[i] = steps[i]
                .to_um(self.constraints.steps_per_m[i])
                .ok_or(PlanError::Overflow)?;
            position[i] = steps[i];
        }
        self.position = position;
        self.position_um = position_um;
        Ok(())
    }

    /// Plan a move from the current planned position.
    ///
    /// `previous` is the last queued move, if any, and is only read for
    /// look-ahead.
    ///
    /// # Errors
    ///
    /// - [`PlanError::EmptyMove`] if no axis needs a step
    /// - [`PlanError::AxisDisabled`] if the target moves an axis that is not fitted
    /// - [`PlanError::Overflow`] if the target cannot be expressed in steps
    pub fn plan(&mut self, request: &MoveRequest, previous: Option<&Dda>) -> Result<Dda> {
        let c = &self.constraints;

        let mut target_steps = [Steps::default(); NUM_AXES];
        let mut delta = [Steps::default(); NUM_AXES];
        let mut delta_um = [0i32; NUM_AXES];
        for axis in Axis::ALL {
            let i = axis.index();
            if !c.axis_enabled(axis) {
                if request.target[i] != self.position_um[i] {
                    return Err(PlanError::AxisDisabled(axis).into());
                }
                target_steps[i] = self.position[i];
                continue;
            }
            target_steps[i] = request.target[i]
                .to_steps(c.steps_per_m[i])
                .ok_or(PlanError::Overflow)?;
            delta[i] = Steps(
                target_steps[i]
                    .0
                    .checked_sub(self.position[i].0)
                    .ok_or(PlanError::Overflow)?,
            );
            delta_um[i] = request.target[i]
                .0
                .checked_sub(self.position_um[i].0)
                .ok_or(PlanError::Overflow)?;
        }

        let total_steps = delta.iter().map(|d| d.abs()).max().unwrap_or(0);
        if total_steps == 0 {
            return Err(PlanError::EmptyMove.into());
        }

        let abs_um = delta_um.map(|d| d.unsigned_abs());
        let mut distance_um = distance(&abs_um[..Axis::E.index()]);
        if distance_um == 0 {
            distance_um = abs_um[Axis::E.index()];
        }
        let distance_um = distance_um.max(1);

        // Slowest of: the requested feedrate and every axis at its own limit.
        let mut ticks = duration_ticks(distance_um, request.feedrate.0, c.clock_period_ms).unwrap_or(0);
        for axis in Axis::ALL {
            let i = axis.index();
            if delta[i].0 != 0 {
                if let Some(t) = duration_ticks(abs_um[i], c.max_feedrate[i].0, c.clock_period_ms) {
                    ticks = ticks.max(t);
                }
            }
        }
        let ticks = ticks.max(1);
        let mut cruise = speed_for_duration(distance_um, ticks, c.clock_period_ms).max(1);
        if request.feedrate.0 > 0 {
            cruise = cruise.min(request.feedrate.0);
        }

        if c.strategy == StrategyKind::Ramping {
            let slowest = Axis::ALL
                .into_iter()
                .filter(|a| delta[a.index()].0 != 0)
                .map(|a| c.max_feedrate[a.index()].0)
                .filter(|&f| f > 0)
                .min();
            if let Some(limit) = slowest {
                cruise = cruise.min(limit);
            }
        }

        let cruise_ticks = duration_ticks(distance_um, cruise, c.clock_period_ms)
            .unwrap_or(ticks)
            .max(1);
        let k = rate_const(distance_um, total_steps, c.timer_hz);
        let plan = SpeedPlan::new(
            c,
            &PlanInputs {
                axis_steps: delta.map(|d| d.abs()),
                total_steps,
                distance_um,
                rate_const: k,
                start: 0,
                cruise,
                end: 0,
            },
        );

        let mut dda = Dda {
            id: self.next_id,
            delta,
            delta_um,
            total_steps,
            distance_um,
            start_rate: MmPerMinute(0),
            cruise_rate: MmPerMinute(cruise),
            end_rate: MmPerMinute(0),
            rate_const: k,
            cruise_ticks,
            endstops: request.endstops,
            plan,
            join: None,
        };

        if c.lookahead && request.endstops.is_empty() {
            if let Some(prev) = previous.filter(|p| p.endstops.is_empty()) {
                let speed = self
                    .joiner
                    .crossing_speed(prev, &dda)
                    .min(reachable_speed(prev.start_rate.0, c.acceleration_mm_per_s2, prev.distance_um))
                    .min(reachable_speed(0, c.acceleration_mm_per_s2, dda.distance_um));
                if speed > 0 {
                    dda.join = Some(Join {
                        prev_id: prev.id,
                        speed: MmPerMinute(speed),
                    });
                    dda.set_start_rate(MmPerMinute(speed), c);
                }
            }
        }

        self.position_um = request.target;
        self.position = target_steps;
        self.next_id = self.next_id.next();

        Ok(dda)
    }
}
