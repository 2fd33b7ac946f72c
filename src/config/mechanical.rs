//! Machine constraints derived from configuration.

use super::axis::{Axis, NUM_AXES};
use super::machine::{MachineConfig, StrategyKind};
use super::units::{MmPerMinute, StepsPerMeter, TimerTicks};

/// Derived motion parameters computed from machine configuration.
///
/// These are computed once at initialization and used for all motion planning
/// and by both execution contexts.
#[derive(Debug, Clone, Copy)]
pub struct MachineConstraints {
    /// Active speed strategy.
    pub strategy: StrategyKind,

    /// Step timer frequency in Hz.
    pub timer_hz: u32,

    /// Clock handler period in milliseconds.
    pub clock_period_ms: u32,

    /// Step timer ticks elapsing during one clock tick.
    pub ticks_per_clock: u32,

    /// Acceleration along the move in mm/s².
    pub acceleration_mm_per_s2: u32,

    /// Speed gained per clock tick at full acceleration, in mm/min.
    ///
    /// Floored to 1 so that ramp durations stay finite.
    pub accel_per_clock: u32,

    /// Shortest interval the step timer may be armed with.
    pub min_interval: TimerTicks,

    /// Consecutive triggered readings that confirm an endstop.
    pub endstop_debounce: u8,

    /// Largest per-axis speed change at a joined corner.
    pub max_jerk: MmPerMinute,

    /// Whether adjacent moves are joined.
    pub lookahead: bool,

    /// Per-axis resolution.
    pub steps_per_m: [StepsPerMeter; NUM_AXES],

    /// Per-axis maximum feedrate.
    pub max_feedrate: [MmPerMinute; NUM_AXES],

    /// Per-axis direction inversion.
    pub invert_direction: [bool; NUM_AXES],

    /// Per-axis endstop polarity.
    pub endstop_active_high: [bool; NUM_AXES],
}

impl MachineConstraints {
    /// Compute machine constraints from configuration.
    pub fn from_config(config: &MachineConfig) -> Self {
        let motion = &config.motion;

        let ticks_per_clock =
            (motion.timer_frequency_hz as u64 * motion.clock_period_ms as u64 / 1000)
                .min(u32::MAX as u64) as u32;

        // mm/s² * ms -> mm/s gained per tick, * 60 -> mm/min
        let accel_per_clock =
            ((motion.acceleration_mm_per_s2 as u64 * motion.clock_period_ms as u64 * 60) / 1000)
                .clamp(1, u32::MAX as u64) as u32;

        let mut steps_per_m = [StepsPerMeter::default(); NUM_AXES];
        let mut max_feedrate = [MmPerMinute::default(); NUM_AXES];
        let mut invert_direction = [false; NUM_AXES];
        let mut endstop_active_high = [true; NUM_AXES];
        for (axis, cfg) in config.axes.iter() {
            let i = axis.index();
            steps_per_m[i] = cfg.steps_per_m;
            max_feedrate[i] = cfg.max_feedrate;
            invert_direction[i] = cfg.invert_direction;
            endstop_active_high[i] = cfg.endstop_active_high;
        }

        Self {
            strategy: motion.strategy,
            timer_hz: motion.timer_frequency_hz,
            clock_period_ms: motion.clock_period_ms,
            ticks_per_clock,
            acceleration_mm_per_s2: motion.acceleration_mm_per_s2,
            accel_per_clock,
            min_interval: motion.min_step_interval,
            endstop_debounce: motion.endstop_debounce_ticks.max(1),
            max_jerk: motion.max_jerk,
            lookahead: motion.lookahead,
            steps_per_m,
            max_feedrate,
            invert_direction,
            endstop_active_high,
        }
    }

    /// Whether an axis is fitted.
    #[inline]
    pub fn axis_enabled(&self, axis: Axis) -> bool {
        self.steps_per_m[axis.index()].0 > 0
    }

    /// Clamp an interval to the shortest armable value.
    #[inline]
    pub fn clamp_interval(&self, ticks: u32) -> u32 {
        ticks.max(self.min_interval.0)
    }
}
