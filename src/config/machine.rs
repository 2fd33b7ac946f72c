//! Machine configuration - root configuration structure.

use serde::Deserialize;

use super::axis::{AxesConfig, Axis, AxisConfig};
use super::units::{MmPerMinute, TimerTicks};

/// Where and how the speed of a move is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Speed recomputed by the step handler at each step inside a ramp.
    #[default]
    Ramping,
    /// Speed recomputed by the clock handler from elapsed time.
    Clock,
    /// Each axis runs on its own step interval at constant speed.
    Temporal,
}

/// Motion parameters shared by every axis.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MotionConfig {
    /// Active speed strategy.
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Step timer input frequency.
    #[serde(default = "default_timer_frequency")]
    pub timer_frequency_hz: u32,

    /// Period of the clock handler.
    #[serde(default = "default_clock_period")]
    pub clock_period_ms: u32,

    /// Acceleration limit along the move.
    pub acceleration_mm_per_s2: u32,

    /// Shortest interval the step timer may be armed with.
    #[serde(default = "default_min_interval", rename = "min_step_interval_ticks")]
    pub min_step_interval: TimerTicks,

    /// Consecutive clock ticks an endstop must read triggered.
    #[serde(default = "default_debounce")]
    pub endstop_debounce_ticks: u8,

    /// Largest per-axis speed change allowed at a joined corner.
    #[serde(default = "default_max_jerk", rename = "max_jerk_mm_per_min")]
    pub max_jerk: MmPerMinute,

    /// Join adjacent moves at a crossing speed instead of stopping.
    #[serde(default)]
    pub lookahead: bool,

    /// Initial state of the runtime trace flag.
    #[serde(default)]
    pub debug: bool,
}

fn default_timer_frequency() -> u32 {
    16_000_000
}

fn default_clock_period() -> u32 {
    2
}

fn default_min_interval() -> TimerTicks {
    TimerTicks(200)
}

fn default_debounce() -> u8 {
    3
}

fn default_max_jerk() -> MmPerMinute {
    MmPerMinute(200)
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            timer_frequency_hz: default_timer_frequency(),
            clock_period_ms: default_clock_period(),
            acceleration_mm_per_s2: 1000,
            min_step_interval: default_min_interval(),
            endstop_debounce_ticks: default_debounce(),
            max_jerk: default_max_jerk(),
            lookahead: false,
            debug: false,
        }
    }
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MachineConfig {
    /// Motion parameters.
    pub motion: MotionConfig,

    /// Per-axis configuration.
    #[serde(default)]
    pub axes: AxesConfig,
}

impl MachineConfig {
    /// Get an axis configuration.
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        self.axes.get(axis)
    }

    /// List the fitted axes.
    pub fn enabled_axes(&self) -> impl Iterator<Item = Axis> + '_ {
        self.axes
            .iter()
            .filter(|(_, cfg)| cfg.is_enabled())
            .map(|(axis, _)| axis)
    }
}
