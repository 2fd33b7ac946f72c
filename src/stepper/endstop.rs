//! Endstop inputs sampled by the clock handler.

use embedded_hal::digital::InputPin;

use crate::config::{Axis, MachineConstraints, NUM_AXES};

/// Raw endstop state per axis. Debouncing happens in the clock handler.
pub trait EndstopInputs {
    /// Whether the endstop of `axis` currently reads as triggered.
    fn is_triggered(&mut self, axis: Axis) -> bool;
}

/// Machine without endstops.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEndstops;

impl EndstopInputs for NoEndstops {
    fn is_triggered(&mut self, _axis: Axis) -> bool {
        false
    }
}

/// Endstop switches on embedded-hal input pins.
///
/// A pin that fails to read counts as triggered.
pub struct EndstopPins<I: InputPin> {
    pins: [Option<I>; NUM_AXES],
    active_high: [bool; NUM_AXES],
}

impl<I: InputPin> EndstopPins<I> {
    /// No pins yet; polarity from the machine constraints.
    pub fn new(constraints: &MachineConstraints) -> Self {
        Self {
            pins: core::array::from_fn(|_| None),
            active_high: constraints.endstop_active_high,
        }
    }

    /// Attach the switch of an axis.
    pub fn with_pin(mut self, axis: Axis, pin: I) -> Self {
        self.pins[axis.index()] = Some(pin);
        self
    }

    /// Give the pins back.
    pub fn release(self) -> [Option<I>; NUM_AXES] {
        self.pins
    }
}

impl<I: InputPin> EndstopInputs for EndstopPins<I> {
    fn is_triggered(&mut self, axis: Axis) -> bool {
        let active_high = self.active_high[axis.index()];
        match self.pins[axis.index()].as_mut() {
            Some(pin) => pin.is_high().map_or(true, |high| high == active_high),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn test_polarity() {
        let mut config = MachineConfig::default();
        config.axes.y.endstop_active_high = false;
        let c = MachineConstraints::from_config(&config);

        let x = PinMock::new(&[Transaction::get(State::High), Transaction::get(State::Low)]);
        let y = PinMock::new(&[Transaction::get(State::Low)]);
        let mut endstops = EndstopPins::new(&c)
            .with_pin(Axis::X, x)
            .with_pin(Axis::Y, y);

        assert!(endstops.is_triggered(Axis::X));
        assert!(!endstops.is_triggered(Axis::X));
        assert!(endstops.is_triggered(Axis::Y));
        assert!(!endstops.is_triggered(Axis::Z));

        for pin in endstops.release().iter_mut().flatten() {
            pin.done();
        }
    }
}
