//! Unit types for physical quantities.
//!
//! Provides type-safe representations of positions, feedrates, axis
//! resolution and the two time bases (step timer ticks and clock ticks) to
//! prevent unit confusion at compile time. All of them are integers: nothing
//! downstream of planning touches floating point.

use core::ops::{Add, Sub};

use serde::Deserialize;

/// Linear position or distance in micrometers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Micrometers(pub i32);

impl Micrometers {
    /// Create a new Micrometers value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Create from whole millimeters.
    #[inline]
    pub const fn from_mm(mm: i32) -> Self {
        Self(mm * 1000)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Convert to steps at the given resolution, rounding to nearest.
    ///
    /// Returns `None` if the result does not fit in an `i32`.
    pub fn to_steps(self, steps_per_m: StepsPerMeter) -> Option<Steps> {
        let num = self.0 as i64 * steps_per_m.0 as i64;
        let half = if num >= 0 { 500_000 } else { -500_000 };
        i32::try_from((num + half) / 1_000_000).ok().map(Steps)
    }
}

impl Add for Micrometers {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Micrometers {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Feedrate in millimeters per minute.
///
/// This is also the unit of a move's step rate: the timer interval of a step
/// is always derived from a speed in mm/min through the move's rate constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct MmPerMinute(pub u32);

impl MmPerMinute {
    /// Create a new MmPerMinute value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Axis resolution in steps per meter.
///
/// Zero marks an axis that is not fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct StepsPerMeter(pub u32);

impl StepsPerMeter {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Axis position or delta in steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Steps(pub i32);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Get absolute value as u32.
    #[inline]
    pub fn abs(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// Convert to a position at the given resolution, rounding to nearest.
    ///
    /// Returns `None` for a zero resolution or a result outside `i32`.
    pub fn to_um(self, steps_per_m: StepsPerMeter) -> Option<Micrometers> {
        if steps_per_m.0 == 0 {
            return None;
        }
        let num = self.0 as i64 * 1_000_000;
        let den = steps_per_m.0 as i64;
        let half = if num >= 0 { den / 2 } else { -(den / 2) };
        i32::try_from((num + half) / den).ok().map(Micrometers)
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Interval measured in step-timer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct TimerTicks(pub u32);

impl TimerTicks {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Duration measured in clock-handler periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTicks(pub u32);

impl ClockTicks {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}
