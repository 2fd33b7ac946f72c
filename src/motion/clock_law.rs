//! Clock-synchronous velocity-time law.
//!
//! The clock handler evaluates the move's speed directly from elapsed clock
//! ticks instead of walking a ramp step by step:
//!
//! ```text
//! accelerating:  v = v_start + a * t
//! cruising:      v = v_cruise
//! decelerating:  v = v_end   + a * (T - t)
//! ```
//!
//! `a` is the speed gained per clock tick. The speed computed at tick `t`
//! governs the period from `t` to `t + 1`, so the law is evaluated at the
//! middle of that period. Tick `decel_start` is therefore the first one that
//! decelerates.
//!
//! The duration comes from the move's area, its length in speed × ticks.
//! Ramps are charged at what they actually cover, which for a ramp from rest
//! is half its length at cruise. Whatever area does not fill a whole cruise
//! tick is spread over the ramp ticks, so the law covers the move exactly
//! and the last step lands on `total_ticks`.
//!
//! Edge speeds are floored at one step per clock period. Below that a ramp
//! has no tick resolution left: the last step of a ramp down to rest would
//! span many ticks on an interval fixed at the step before it.

use super::fixed::{isqrt, nearest_interval};
use super::strategy::MotionPhase;

/// Inputs for a clock plan.
#[derive(Debug, Clone, Copy)]
pub struct ClockInputs {
    /// Speed-to-interval constant of the move.
    pub rate_const: u64,
    /// Length of the move in speed × ticks.
    pub area: u64,
    /// Speed at the start, mm/min.
    pub start: u32,
    /// Cruise speed, mm/min.
    pub cruise: u32,
    /// Speed at the end, mm/min.
    pub end: u32,
    /// Speed gained per clock tick, mm/min.
    pub accel_per_tick: u32,
    /// Lowest edge speed, mm/min.
    pub min_speed: u32,
}

impl ClockInputs {
    /// Area of `total_steps` steps: each one covers `rate_const` timer ticks
    /// at unit speed.
    pub fn area_of(rate_const: u64, total_steps: u32, ticks_per_clock: u32) -> u64 {
        (rate_const as u128 * total_steps as u128 / ticks_per_clock.max(1) as u128).min(u64::MAX as u128) as u64
    }

    /// Speed at which one step takes one clock period.
    pub fn step_per_tick_speed(rate_const: u64, ticks_per_clock: u32) -> u32 {
        (rate_const / ticks_per_clock.max(1) as u64).min(u32::MAX as u64) as u32
    }
}

/// Timing envelope of one move under the clock strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockPlan {
    /// Speed-to-interval constant of the move.
    pub rate_const: u64,
    /// Speed at the start, mm/min.
    pub start: u32,
    /// Cruise speed, mm/min.
    pub cruise: u32,
    /// Speed at the end, mm/min.
    pub end: u32,
    /// Speed gained per clock tick, mm/min.
    pub accel_per_tick: u32,
    /// Duration of the acceleration ramp.
    pub accel_ticks: u32,
    /// First decelerating tick.
    pub decel_start: u32,
    /// Planned duration of the whole move.
    pub total_ticks: u32,
    /// Area spread over the ramp ticks.
    pub remainder: u32,
}

/// How far actual completion landed from the planned duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Skew {
    /// Within one tick of the plan.
    OnTime,
    /// Finished this many ticks early.
    Undershoot(u32),
    /// Finished this many ticks late.
    Overshoot(u32),
}

/// Compare actual completion time against the plan, with one tick of slack.
pub fn completion_skew(total_ticks: u32, elapsed: u32) -> Skew {
    if elapsed.saturating_add(1) < total_ticks {
        Skew::Undershoot(total_ticks - elapsed)
    } else if elapsed > total_ticks.saturating_add(1) {
        Skew::Overshoot(elapsed - total_ticks)
    } else {
        Skew::OnTime
    }
}

/// Area of `ticks` ramp ticks from `from`, each sampled at its midpoint.
fn ramp_area(from: u32, a: u32, ticks: u32) -> u64 {
    let (v, a, n) = (from as u64, a as u64, ticks as u64);
    v * n + a * n * n.saturating_sub(1) / 2 + a / 2 * n
}

impl ClockPlan {
    /// Plan a move.
    ///
    /// Edge speeds are raised to `min_speed` and clamped to cruise. If the
    /// ramps do not fit, the cruise speed is lowered to the peak of a
    /// triangular profile.
    pub fn new(m: &ClockInputs) -> Self {
        let a = m.accel_per_tick.max(1);
        let mut cruise = m.cruise.max(1);
        let floor = m.min_speed.min(cruise);
        let start = m.start.clamp(floor, cruise);
        let end = m.end.clamp(floor, cruise);

        let mut accel_ticks = (cruise - start) / a;
        let mut decel_ticks = (cruise - end) / a;
        let mut ramps = ramp_area(start, a, accel_ticks) + ramp_area(end, a, decel_ticks);

        if ramps > m.area {
            let peak_sq = a as u64 * m.area + (start as u64 * start as u64 + end as u64 * end as u64) / 2;
            cruise = (isqrt(peak_sq).min(cruise as u64) as u32).max(start).max(end).max(1);
            accel_ticks = (cruise - start) / a;
            decel_ticks = (cruise - end) / a;
            ramps = ramp_area(start, a, accel_ticks) + ramp_area(end, a, decel_ticks);
        }

        let rest = m.area.saturating_sub(ramps);
        let ramp_ticks = accel_ticks as u64 + decel_ticks as u64;
        let mut cruise_ticks = rest / cruise as u64;
        let mut remainder = rest % cruise as u64;
        // Half a tick of acceleration per ramp tick keeps every tick at or
        // below cruise; past that, round to the nearest cruise tick.
        if remainder > (a / 2) as u64 * ramp_ticks {
            cruise_ticks = (rest + cruise as u64 / 2) / cruise as u64;
            remainder = 0;
        }

        let total = (ramp_ticks + cruise_ticks).clamp(1, u32::MAX as u64) as u32;

        Self {
            rate_const: m.rate_const,
            start,
            cruise,
            end,
            accel_per_tick: a,
            accel_ticks,
            decel_start: total.saturating_sub(decel_ticks),
            total_ticks: total,
            remainder: remainder as u32,
        }
    }

    fn decel_ticks(&self) -> u32 {
        self.total_ticks - self.decel_start
    }

    /// Share of the remainder carried by ramp tick `i`.
    fn spread(&self, i: u32) -> u32 {
        let n = (self.accel_ticks as u64 + self.decel_ticks() as u64).max(1);
        let r = self.remainder as u64;
        let i = i as u64;
        (r * (i + 1) / n - r * i / n) as u32
    }

    /// Phase and speed at `elapsed` ticks since the move started.
    ///
    /// Elapsed time past the plan is clamped to the planned duration, and the
    /// remaining time floors to one tick. A pure function of its inputs.
    pub fn speed_at(&self, elapsed: u32) -> (MotionPhase, u32) {
        let t = elapsed.min(self.total_ticks);
        let a = self.accel_per_tick;

        if t < self.accel_ticks {
            let v = self
                .start
                .saturating_add(a.saturating_mul(t))
                .saturating_add(a / 2)
                .saturating_add(self.spread(t));
            (MotionPhase::Accelerating, v.max(1))
        } else if self.decel_ticks() > 0 && t >= self.decel_start {
            let remaining = (self.total_ticks - t).max(1);
            let v = self
                .end
                .saturating_add(a.saturating_mul(remaining - 1))
                .saturating_add(a / 2)
                .saturating_add(self.spread(self.accel_ticks + remaining - 1));
            (MotionPhase::Decelerating, v.max(1))
        } else {
            (MotionPhase::Cruising, self.cruise)
        }
    }

    /// Phase and timer interval at `elapsed` ticks.
    pub fn interval_at(&self, elapsed: u32) -> (MotionPhase, u32) {
        let (phase, speed) = self.speed_at(elapsed);
        (phase, nearest_interval(self.rate_const, speed))
    }

    /// Interval armed for the first step.
    pub fn initial_interval(&self) -> u32 {
        self.interval_at(0).1
    }
}
