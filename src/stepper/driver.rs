//! Axis pin drivers.
//!
//! Generic over embedded-hal 1.0 output pins.

use embedded_hal::digital::OutputPin;

use crate::config::{Axis, MachineConstraints, Steps, NUM_AXES};
use crate::error::StepError;

/// Direction of travel along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Toward positive coordinates.
    Positive,
    /// Toward negative coordinates.
    Negative,
}

impl Direction {
    /// Direction of a signed step delta; zero counts as positive.
    #[inline]
    pub fn of(delta: Steps) -> Self {
        if delta.0 < 0 {
            Direction::Negative
        } else {
            Direction::Positive
        }
    }

    /// Position change of one step.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }
}

/// STEP/DIR outputs of one axis plus its absolute step position.
pub struct AxisDriver<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// STEP pin (one pulse per step).
    step_pin: STEP,

    /// DIR pin (high = positive, unless inverted).
    dir_pin: DIR,

    /// Last direction written (cached to avoid unnecessary pin writes).
    direction: Option<Direction>,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Absolute position in steps.
    position: Steps,
}

impl<STEP, DIR> AxisDriver<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// Create a driver at position zero with an unknown direction.
    pub fn new(step_pin: STEP, dir_pin: DIR, invert_direction: bool) -> Self {
        Self {
            step_pin,
            dir_pin,
            direction: None,
            invert_direction,
            position: Steps::default(),
        }
    }

    /// Absolute position in steps.
    #[inline]
    pub fn position(&self) -> Steps {
        self.position
    }

    /// Redefine the absolute position.
    #[inline]
    pub fn set_position(&mut self, position: Steps) {
        self.position = position;
    }

    /// Last direction written to the DIR pin.
    #[inline]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Drive the DIR pin, skipping the write if it already points that way.
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), StepError> {
        if self.direction == Some(direction) {
            return Ok(());
        }

        let pin_high = match direction {
            Direction::Positive => !self.invert_direction,
            Direction::Negative => self.invert_direction,
        };

        if pin_high {
            self.dir_pin.set_high().map_err(|_| StepError::PinError)?;
        } else {
            self.dir_pin.set_low().map_err(|_| StepError::PinError)?;
        }

        self.direction = Some(direction);
        Ok(())
    }

    /// Emit one step pulse in the current direction.
    pub fn pulse(&mut self) -> Result<(), StepError> {
        self.step_pin.set_high().map_err(|_| StepError::PinError)?;
        self.step_pin.set_low().map_err(|_| StepError::PinError)?;

        let sign = self.direction.unwrap_or(Direction::Positive).sign();
        self.position = Steps(self.position.0 + sign);
        Ok(())
    }

    /// Give the pins back.
    pub fn release(self) -> (STEP, DIR) {
        (self.step_pin, self.dir_pin)
    }
}

/// One optional driver per axis.
pub struct AxisDrivers<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    drivers: [Option<AxisDriver<STEP, DIR>>; NUM_AXES],
    invert_direction: [bool; NUM_AXES],
}

impl<STEP, DIR> AxisDrivers<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// No axes yet; direction inversion from the machine constraints.
    pub fn new(constraints: &MachineConstraints) -> Self {
        Self {
            drivers: core::array::from_fn(|_| None),
            invert_direction: constraints.invert_direction,
        }
    }

    /// Attach the pins of an axis.
    pub fn with_axis(mut self, axis: Axis, step_pin: STEP, dir_pin: DIR) -> Self {
        let invert = self.invert_direction[axis.index()];
        self.drivers[axis.index()] = Some(AxisDriver::new(step_pin, dir_pin, invert));
        self
    }

    /// Driver of an axis.
    #[inline]
    pub fn get(&self, axis: Axis) -> Option<&AxisDriver<STEP, DIR>> {
        self.drivers[axis.index()].as_ref()
    }

    /// Mutable driver of an axis.
    #[inline]
    pub fn get_mut(&mut self, axis: Axis) -> Option<&mut AxisDriver<STEP, DIR>> {
        self.drivers[axis.index()].as_mut()
    }

    /// Absolute position of every axis; zero for axes without a driver.
    pub fn positions(&self) -> [Steps; NUM_AXES] {
        let mut out = [Steps::default(); NUM_AXES];
        for (pos, driver) in out.iter_mut().zip(self.drivers.iter()) {
            if let Some(d) = driver {
                *pos = d.position();
            }
        }
        out
    }

    /// Give all drivers back.
    pub fn release(self) -> [Option<AxisDriver<STEP, DIR>>; NUM_AXES] {
        self.drivers
    }
}
