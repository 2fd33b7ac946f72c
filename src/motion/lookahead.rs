//! Look-ahead joining of adjacent moves.
//!
//! A joiner proposes a crossing speed for the corner between two moves. The
//! previous move then ends at that speed and the next one starts at it. The
//! result carries the id of the move it was computed against; if that move
//! has started executing by the time the join is applied, the join is
//! discarded and the new move starts from a standstill.

use crate::config::{Axis, MmPerMinute};

use super::dda::{Dda, MoveId};

/// Crossing speed agreed between two adjacent moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Join {
    /// Move whose end speed must be raised.
    pub prev_id: MoveId,
    /// Speed at the corner.
    pub speed: MmPerMinute,
}

/// Computes the corner speed between two moves.
pub trait Joiner {
    /// Crossing speed in mm/min; zero means stop at the corner.
    fn crossing_speed(&self, prev: &Dda, next: &Dda) -> u32;
}

/// Max-jerk corner speed.
///
/// Both moves are projected onto the X/Y/Z axes at the slower of the two
/// cruise speeds. If any axis changes speed by more than the jerk limit
/// across the corner, the crossing speed is scaled down until it does not.
#[derive(Debug, Clone, Copy)]
pub struct CrossingSpeed {
    /// Largest allowed per-axis speed change.
    pub max_jerk: MmPerMinute,
}

impl CrossingSpeed {
    /// Create a joiner with the given jerk limit.
    pub fn new(max_jerk: MmPerMinute) -> Self {
        Self { max_jerk }
    }
}

impl Joiner for CrossingSpeed {
    fn crossing_speed(&self, prev: &Dda, next: &Dda) -> u32 {
        if prev.distance_um == 0 || next.distance_um == 0 {
            return 0;
        }

        let speed = prev.cruise_rate.0.min(next.cruise_rate.0) as i64;
        let component = |dda: &Dda, axis: Axis| {
            dda.delta_um[axis.index()] as i64 * speed / dda.distance_um as i64
        };

        let max_dv = [Axis::X, Axis::Y, Axis::Z]
            .into_iter()
            .map(|axis| (component(next, axis) - component(prev, axis)).unsigned_abs())
            .max()
            .unwrap_or(0);

        let jerk = self.max_jerk.0 as u64;
        let speed = speed as u64;
        let crossing = if max_dv > jerk {
            speed * jerk / max_dv
        } else {
            speed
        };
        crossing.min(u32::MAX as u64) as u32
    }
}
