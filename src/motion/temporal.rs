//! Time-per-axis stepping.
//!
//! Instead of slaving minor axes to the dominant one, every axis gets its own
//! step interval so that all axes finish together. The step handler fires at
//! the earliest pending axis event. Speed is constant at cruise.

use crate::config::NUM_AXES;

/// Per-axis step schedule of one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalPlan {
    /// Timer ticks between two steps of each axis; zero for idle axes.
    pub axis_interval: [u32; NUM_AXES],
    /// Duration of the move in timer ticks.
    pub duration: u64,
}

impl TemporalPlan {
    /// Plan a move of `distance_um` at `cruise` mm/min.
    pub fn new(axis_steps: [u32; NUM_AXES], distance_um: u32, cruise: u32, timer_hz: u32) -> Self {
        let num = distance_um as u128 * timer_hz as u128 * 60;
        let den = 1000u128 * cruise.max(1) as u128;
        let duration = (num / den).clamp(1, u64::MAX as u128) as u64;

        let mut axis_interval = [0u32; NUM_AXES];
        for (interval, &steps) in axis_interval.iter_mut().zip(axis_steps.iter()) {
            if steps > 0 {
                *interval = (duration / steps as u64).clamp(1, u32::MAX as u64) as u32;
            }
        }

        Self {
            axis_interval,
            duration,
        }
    }

    /// Interval until the first step of any axis.
    pub fn initial_interval(&self) -> u32 {
        self.axis_interval
            .iter()
            .copied()
            .filter(|&i| i > 0)
            .min()
            .unwrap_or(u32::MAX)
    }
}
