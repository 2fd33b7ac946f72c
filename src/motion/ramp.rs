//! Step-synchronous ramp law.
//!
//! The step handler recomputes the timer interval after every step that falls
//! inside a ramp, using the recurrence from "Generate stepper-motor speed
//! profiles in real time" (D. Austin):
//!
//! ```text
//! c' = c - 2c / (4n + 1)
//! ```
//!
//! `n` is a signed ramp counter: positive and growing while ramping up,
//! negative and shrinking towards zero while ramping down. The first
//! interval from rest is `0.676 * f * sqrt(2 / a)`.

use libm::sqrtf;

use super::fixed::interval_for;
use super::strategy::MotionPhase;
use crate::error::StepError;

/// Per-move ramp progress, owned by the step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RampState {
    /// Signed ramp counter.
    pub n: i32,
    /// Ramp-down has started.
    pub descending: bool,
}

/// Ramp boundaries and interval limits of one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampPlan {
    /// Steps in the move.
    pub total_steps: u32,
    /// Number of intervals spent ramping up.
    pub rampup_steps: u32,
    /// Step number after which ramp-down starts.
    pub rampdown_start: u32,
    /// Ramp counter at the start speed.
    pub start_n: u32,
    /// Ramp counter at the end speed.
    pub end_n: u32,
    /// Interval armed for the first step.
    pub c_initial: u32,
    /// Interval at cruise speed; ramping up never goes below it.
    pub c_cruise: u32,
    /// Slowest interval ramping down may reach.
    pub c_floor: u32,
}

/// Inputs for a ramp plan, all taken from the move descriptor.
#[derive(Debug, Clone, Copy)]
pub struct RampInputs {
    /// Dominant-axis step count.
    pub total_steps: u32,
    /// Length of the move.
    pub distance_um: u32,
    /// Speed-to-interval constant of the move.
    pub rate_const: u64,
    /// Speed at the first step, mm/min.
    pub start: u32,
    /// Cruise speed, mm/min.
    pub cruise: u32,
    /// Speed at the last step, mm/min.
    pub end: u32,
    /// Acceleration along the move.
    pub acceleration_mm_per_s2: u32,
    /// Step timer frequency.
    pub timer_hz: u32,
}

/// Steps needed to accelerate from rest to `speed`.
///
/// `n = v² / 2a` with both converted to steps along the move.
pub fn ramp_steps(speed: u32, total_steps: u32, distance_um: u32, accel_mm_per_s2: u32) -> u32 {
    let num = speed as u128 * speed as u128 * total_steps as u128 * 1000;
    let den = 7200u128 * accel_mm_per_s2.max(1) as u128 * distance_um.max(1) as u128;
    (num / den).min(u32::MAX as u128) as u32
}

/// First interval from rest, in timer ticks.
pub fn first_interval(timer_hz: u32, total_steps: u32, distance_um: u32, accel_mm_per_s2: u32) -> u32 {
    let accel_steps =
        (accel_mm_per_s2 as u64 * total_steps as u64 * 1000 / distance_um.max(1) as u64).max(1);
    (0.676 * timer_hz as f32 * sqrtf(2.0 / accel_steps as f32)) as u32
}

impl RampPlan {
    /// Plan the ramps of a move.
    pub fn new(m: &RampInputs) -> Self {
        let total = m.total_steps;
        let steps_to = |speed| ramp_steps(speed, total, m.distance_um, m.acceleration_mm_per_s2);

        let cruise_n = steps_to(m.cruise);
        let start_n = steps_to(m.start).min(cruise_n);
        let end_n = steps_to(m.end).min(cruise_n);

        let mut up = cruise_n - start_n;
        let mut down = cruise_n - end_n;
        if up as u64 + down as u64 > total as u64 {
            // Triangle: the ramps meet where both reach the same counter.
            let u = (total as i64 + end_n as i64 - start_n as i64) / 2;
            up = u.clamp(0, total as i64) as u32;
            down = total - up;
        }

        let c0 = first_interval(m.timer_hz, total, m.distance_um, m.acceleration_mm_per_s2);
        let c_cruise = interval_for(m.rate_const, m.cruise);
        // From rest the recurrence needs c0; a moving edge is never slower than it.
        let edge = |speed: u32| interval_for(m.rate_const, speed).min(c0).max(c_cruise);

        Self {
            total_steps: total,
            rampup_steps: up,
            rampdown_start: total - down,
            start_n,
            end_n,
            c_initial: edge(m.start),
            c_cruise,
            c_floor: edge(m.end),
        }
    }

    /// Ramp state at the first step.
    pub fn initial_state(&self) -> RampState {
        RampState {
            n: self.start_n.min(i32::MAX as u32) as i32,
            descending: false,
        }
    }

    /// Phase of the interval that follows step `step_no`.
    pub fn phase_at(&self, step_no: u32) -> MotionPhase {
        if step_no >= self.total_steps {
            MotionPhase::Complete
        } else if step_no <= self.rampup_steps && step_no > 0 {
            MotionPhase::Accelerating
        } else if step_no > self.rampdown_start {
            MotionPhase::Decelerating
        } else {
            MotionPhase::Cruising
        }
    }

    /// Interval to arm after step `step_no`, given the interval `c` that
    /// preceded it.
    ///
    /// Returns `Ok(None)` while cruising (keep `c`).
    ///
    /// # Errors
    ///
    /// Returns [`StepError::RampDirection`] if the ramp counter contradicts the
    /// phase, which means the plan or the move state is corrupt.
    pub fn next_interval(
        &self,
        step_no: u32,
        c: u32,
        ramp: &mut RampState,
    ) -> Result<Option<u32>, StepError> {
        let fault = |ramp: &RampState| StepError::RampDirection {
            step: step_no,
            ramp_n: ramp.n,
        };

        match self.phase_at(step_no) {
            MotionPhase::Accelerating => {
                if ramp.descending || ramp.n < 0 {
                    return Err(fault(ramp));
                }
                ramp.n = ramp.n.saturating_add(1);
                let den = 4 * ramp.n as u64 + 1;
                let next = c as u64 - (2 * c as u64) / den;
                Ok(Some((next as u32).max(self.c_cruise)))
            }
            MotionPhase::Decelerating => {
                if !ramp.descending {
                    ramp.descending = true;
                    let remaining = self.total_steps - step_no;
                    ramp.n = -((remaining.saturating_add(self.end_n)).min(i32::MAX as u32) as i32);
                } else if ramp.n >= 0 {
                    return Err(fault(ramp));
                }
                let den = 4 * ramp.n.unsigned_abs() as u64 - 1;
                let next = (c as u64 + (2 * c as u64) / den).min(u32::MAX as u64) as u32;
                ramp.n += 1;
                Ok(Some(next.min(self.c_floor).max(c)))
            }
            MotionPhase::Cruising | MotionPhase::Complete => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::fixed::rate_const;

    fn inputs(total: u32, start: u32, cruise: u32, end: u32) -> RampInputs {
        // 80 steps/mm
        let distance_um = total * 1000 / 80;
        RampInputs {
            total_steps: total,
            distance_um,
            rate_const: rate_const(distance_um, total, 16_000_000),
            start,
            cruise,
            end,
            acceleration_mm_per_s2: 1000,
            timer_hz: 16_000_000,
        }
    }

    #[test]
    fn test_trapezoid_ramps_are_symmetric() {
        let plan = RampPlan::new(&inputs(8000, 0, 3000, 0));
        // (50 mm/s)² / 2000 mm/s² = 1.25 mm = 100 steps
        assert_eq!(plan.rampup_steps, 100);
        assert_eq!(plan.total_steps - plan.rampdown_start, 100);
        assert!(plan.c_initial > plan.c_cruise);
    }

    #[test]
    fn test_triangle_when_ramps_overlap() {
        let plan = RampPlan::new(&inputs(100, 0, 3000, 0));
        assert_eq!(plan.rampup_steps, 50);
        assert_eq!(plan.rampdown_start, 50);
    }

    #[test]
    fn test_no_ramp_at_constant_speed() {
        let plan = RampPlan::new(&inputs(1000, 3000, 3000, 3000));
        assert_eq!(plan.rampup_steps, 0);
        assert_eq!(plan.rampdown_start, 1000);
        assert_eq!(plan.c_initial, plan.c_cruise);

        let mut ramp = plan.initial_state();
        for step in 1..1000 {
            assert_eq!(plan.next_interval(step, plan.c_cruise, &mut ramp), Ok(None));
        }
    }

    #[test]
    fn test_intervals_shrink_then_grow() {
        let plan = RampPlan::new(&inputs(8000, 0, 3000, 0));
        let mut ramp = plan.initial_state();
        let mut c = plan.c_initial;
        let mut prev = c;
        for step in 1..=plan.rampup_steps {
            c = plan.next_interval(step, c, &mut ramp).unwrap().unwrap();
            assert!(c <= prev);
            assert!(c >= plan.c_cruise);
            prev = c;
        }
        for step in plan.rampdown_start + 1..plan.total_steps {
            c = plan.next_interval(step, c, &mut ramp).unwrap().unwrap();
            assert!(c >= prev);
            assert!(c <= plan.c_floor);
            prev = c;
        }
        assert!(ramp.descending);
    }

    #[test]
    fn test_wrong_direction_is_fatal() {
        let plan = RampPlan::new(&inputs(8000, 0, 3000, 0));
        let mut ramp = RampState {
            n: -5,
            descending: false,
        };
        let result = plan.next_interval(1, plan.c_initial, &mut ramp);
        assert_eq!(result, Err(StepError::RampDirection { step: 1, ramp_n: -5 }));

        let mut ramp = RampState {
            n: 3,
            descending: true,
        };
        let result = plan.next_interval(plan.total_steps - 1, plan.c_cruise, &mut ramp);
        assert!(matches!(result, Err(StepError::RampDirection { .. })));
    }
}
