//! Integer rate arithmetic shared by planning and both execution contexts.
//!
//! A move's rate is a speed in mm/min. The step timer wants ticks per step.
//! The bridge is the move's rate constant:
//!
//! ```text
//! interval_ticks = rate_const / speed_mm_per_min
//! rate_const     = distance_um * timer_hz * 60 / (1000 * total_steps)
//! ```
//!
//! so recomputing an interval inside a handler is one integer division.

/// `a * b / c` through a 64-bit intermediate, saturated to `u32`.
///
/// Returns `u32::MAX` when `c` is zero.
#[inline]
pub fn muldiv(a: u32, b: u32, c: u32) -> u32 {
    if c == 0 {
        return u32::MAX;
    }
    ((a as u64 * b as u64) / c as u64).min(u32::MAX as u64) as u32
}

/// Integer square root, rounded down.
pub fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    // Newton iteration from an over-estimate converges from above.
    let mut x = 1u64 << ((64 - n.leading_zeros() + 1) / 2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Euclidean length of a per-axis distance vector, in the input unit.
pub fn distance(components: &[u32]) -> u32 {
    let sum = components
        .iter()
        .map(|&c| c as u64 * c as u64)
        .fold(0u64, u64::saturating_add);
    isqrt(sum).min(u32::MAX as u64) as u32
}

/// Rate constant for a move of `distance_um` covered in `total_steps`.
///
/// Floors to 1 so that a degenerate move never yields a zero interval.
pub fn rate_const(distance_um: u32, total_steps: u32, timer_hz: u32) -> u64 {
    if total_steps == 0 {
        return 1;
    }
    let num = distance_um as u128 * timer_hz as u128 * 60;
    let den = 1000u128 * total_steps as u128;
    (num / den).clamp(1, u64::MAX as u128) as u64
}

/// Timer interval for a speed, using a move's rate constant.
///
/// A zero speed maps to the longest representable interval.
#[inline]
pub fn interval_for(rate_const: u64, speed: u32) -> u32 {
    if speed == 0 {
        return u32::MAX;
    }
    (rate_const / speed as u64).clamp(1, u32::MAX as u64) as u32
}

/// [`interval_for`], rounded to the nearest tick instead of down.
///
/// Used where intervals are recomputed many times over a move, so that the
/// truncation does not add up to a systematic lead.
#[inline]
pub fn nearest_interval(rate_const: u64, speed: u32) -> u32 {
    if speed == 0 {
        return u32::MAX;
    }
    let speed = speed as u64;
    (rate_const.saturating_add(speed / 2) / speed).clamp(1, u32::MAX as u64) as u32
}

/// Duration in clock ticks of covering `distance_um` at `feed_mm_per_min`.
///
/// Returns `None` for a zero feedrate, which imposes no duration.
pub fn duration_ticks(distance_um: u32, feed_mm_per_min: u32, clock_period_ms: u32) -> Option<u32> {
    if feed_mm_per_min == 0 || clock_period_ms == 0 {
        return None;
    }
    // um / (mm/min) = min/1000 ; * 60_000 ms/min / period -> ticks
    Some(muldiv(distance_um, 60, feed_mm_per_min.saturating_mul(clock_period_ms)))
}

/// Speed in mm/min that covers `distance_um` in `ticks` clock periods.
pub fn speed_for_duration(distance_um: u32, ticks: u32, clock_period_ms: u32) -> u32 {
    muldiv(distance_um, 60, ticks.max(1).saturating_mul(clock_period_ms.max(1)))
}

/// Highest speed reachable from `from` (mm/min) over `distance_um` at
/// `accel_mm_per_s2`: `sqrt(v0² + 2ad)` with `2ad` converted to (mm/min)².
pub fn reachable_speed(from: u32, accel_mm_per_s2: u32, distance_um: u32) -> u32 {
    // 2 * a * d_um / 1000 mm * 3600 (s/min)²
    let gain = accel_mm_per_s2 as u64 * distance_um as u64 * 36 / 5;
    isqrt((from as u64 * from as u64).saturating_add(gain)).min(u32::MAX as u64) as u32
}
