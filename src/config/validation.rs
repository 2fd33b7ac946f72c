//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::axis::{Axis, AxisConfig};
use super::machine::MotionConfig;
use super::MachineConfig;

/// Validate a machine configuration.
///
/// Checks:
/// - Timer frequency, clock period and acceleration are non-zero
/// - One clock period fits in the 32-bit timer tick range
/// - Minimum step interval is non-zero
/// - Every fitted axis has a maximum feedrate
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    validate_motion(&config.motion)?;

    for (axis, cfg) in config.axes.iter() {
        validate_axis(axis, cfg)?;
    }

    Ok(())
}

fn validate_motion(motion: &MotionConfig) -> Result<()> {
    if motion.timer_frequency_hz == 0 {
        return Err(Error::Config(ConfigError::InvalidTimerFrequency(
            motion.timer_frequency_hz,
        )));
    }

    let ticks_per_clock = motion.timer_frequency_hz as u64 * motion.clock_period_ms as u64 / 1000;
    if motion.clock_period_ms == 0 || ticks_per_clock == 0 || ticks_per_clock > u32::MAX as u64 {
        return Err(Error::Config(ConfigError::InvalidClockPeriod(
            motion.clock_period_ms,
        )));
    }

    if motion.acceleration_mm_per_s2 == 0 {
        return Err(Error::Config(ConfigError::InvalidAcceleration(
            motion.acceleration_mm_per_s2,
        )));
    }

    if motion.min_step_interval.0 == 0 {
        return Err(Error::Config(ConfigError::InvalidMinInterval(
            motion.min_step_interval.0,
        )));
    }

    Ok(())
}

fn validate_axis(axis: Axis, cfg: &AxisConfig) -> Result<()> {
    if cfg.is_enabled() && cfg.max_feedrate.0 == 0 {
        return Err(Error::Config(ConfigError::InvalidMaxFeedrate(axis)));
    }

    Ok(())
}
