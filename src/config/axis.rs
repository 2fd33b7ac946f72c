//! Axis identifiers and per-axis configuration.

use core::fmt;

use serde::Deserialize;

use super::units::{MmPerMinute, StepsPerMeter};

/// Number of axes driven by the motion core.
pub const NUM_AXES: usize = 4;

/// A machine axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X carriage.
    X,
    /// Y carriage.
    Y,
    /// Z carriage.
    Z,
    /// Extruder.
    E,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; NUM_AXES] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Index of this axis into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit for this axis in an [`AxisMask`].
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::E => "E",
        };
        f.write_str(name)
    }
}

/// A set of axes, one bit per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMask(pub u8);

impl AxisMask {
    /// No axes.
    pub const NONE: Self = Self(0);

    /// All axes.
    pub const ALL: Self = Self((1 << NUM_AXES) - 1);

    /// Mask containing a single axis.
    #[inline]
    pub const fn of(axis: Axis) -> Self {
        Self(axis.bit())
    }

    /// Add an axis to the mask.
    #[inline]
    pub const fn with(self, axis: Axis) -> Self {
        Self(self.0 | axis.bit())
    }

    /// Check whether an axis is in the mask.
    #[inline]
    pub const fn contains(self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    /// Check whether the mask is empty.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the axes in the mask.
    pub fn iter(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

/// Configuration of one axis from TOML.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AxisConfig {
    /// Resolution; zero disables the axis.
    #[serde(default)]
    pub steps_per_m: StepsPerMeter,

    /// Maximum feedrate this axis can move at.
    #[serde(default, rename = "max_feedrate_mm_per_min")]
    pub max_feedrate: MmPerMinute,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Endstop input reads high when triggered.
    #[serde(default = "default_active_high")]
    pub endstop_active_high: bool,
}

fn default_active_high() -> bool {
    true
}

impl AxisConfig {
    /// Whether the axis is fitted.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.steps_per_m.0 > 0
    }
}

/// Per-axis configuration table.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AxesConfig {
    /// X axis.
    #[serde(default)]
    pub x: AxisConfig,
    /// Y axis.
    #[serde(default)]
    pub y: AxisConfig,
    /// Z axis.
    #[serde(default)]
    pub z: AxisConfig,
    /// Extruder.
    #[serde(default)]
    pub e: AxisConfig,
}

impl AxesConfig {
    /// Get an axis configuration.
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::E => &self.e,
        }
    }

    /// Iterate over `(axis, config)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &AxisConfig)> {
        Axis::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}
