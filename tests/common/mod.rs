//! Discrete-event simulation of the two execution contexts.
//!
//! A virtual step timer and a fixed-period clock are interleaved in time
//! order; at equal times the step handler runs first.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use dda_motion::config::{MachineConfig, NUM_AXES};
use dda_motion::stepper::{AxisDrivers, EndstopInputs, NoEndstops};
use dda_motion::{
    Axis, ClockHandler, Dda, MachineConstraints, Micrometers, MmPerMinute, MotionShared,
    MoveRequest, MoveRing, Planner, StepOutcome, StepTimer, Stepper, StepsPerMeter, StrategyKind,
    TickOutcome, TimerTicks,
};
use embedded_hal::digital::{ErrorType, OutputPin};

/// Step timer on a virtual time line.
#[derive(Default)]
pub struct SimTimer {
    pub now: Cell<u64>,
    pub due: Cell<Option<u64>>,
    pub arms: RefCell<Vec<u32>>,
}

impl StepTimer for SimTimer {
    fn arm(&self, ticks: TimerTicks) {
        self.due.set(Some(self.now.get() + ticks.0 as u64));
        self.arms.borrow_mut().push(ticks.0);
    }

    fn disarm(&self) {
        self.due.set(None);
    }
}

/// Output pin that counts rising edges.
#[derive(Clone, Default)]
pub struct CountingPin {
    high: Rc<Cell<bool>>,
    rises: Rc<Cell<u32>>,
}

impl CountingPin {
    pub fn rises(&self) -> u32 {
        self.rises.get()
    }

    pub fn is_high(&self) -> bool {
        self.high.get()
    }
}

impl ErrorType for CountingPin {
    type Error = Infallible;
}

impl OutputPin for CountingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high.get() {
            self.rises.set(self.rises.get() + 1);
        }
        self.high.set(true);
        Ok(())
    }
}

/// Endstop that triggers once an axis has received `at` pulses.
pub struct PulseSwitch {
    pub axis: Axis,
    pub pin: CountingPin,
    pub at: u32,
}

impl EndstopInputs for PulseSwitch {
    fn is_triggered(&mut self, axis: Axis) -> bool {
        axis == self.axis && self.pin.rises() >= self.at
    }
}

/// Step handler event, with the virtual time it happened at.
#[derive(Debug, Clone, Copy)]
pub struct StepEvent {
    pub time: u64,
    pub outcome: StepOutcome,
}

/// Machine with X/Y at 100 steps/mm, Z at 400 steps/mm, E at 100 steps/mm,
/// a 1 MHz step timer and a 1 ms clock.
pub fn machine(strategy: StrategyKind) -> MachineConfig {
    let mut config = MachineConfig::default();
    config.motion.strategy = strategy;
    config.motion.timer_frequency_hz = 1_000_000;
    config.motion.clock_period_ms = 1;
    config.motion.acceleration_mm_per_s2 = 1000;
    config.motion.min_step_interval = TimerTicks(100);
    config.motion.endstop_debounce_ticks = 1;
    for axis in [&mut config.axes.x, &mut config.axes.y, &mut config.axes.e] {
        axis.steps_per_m = StepsPerMeter(100_000);
        axis.max_feedrate = MmPerMinute(6000);
    }
    config.axes.z.steps_per_m = StepsPerMeter(400_000);
    config.axes.z.max_feedrate = MmPerMinute(600);
    config
}

pub fn target(x: i32, y: i32, z: i32, e: i32) -> [Micrometers; NUM_AXES] {
    [Micrometers(x), Micrometers(y), Micrometers(z), Micrometers(e)]
}

pub struct Sim<E: EndstopInputs = NoEndstops> {
    pub constraints: MachineConstraints,
    pub shared: MotionShared,
    pub timer: SimTimer,
    pub stepper: Stepper<CountingPin, CountingPin>,
    pub clock: ClockHandler<E>,
    pub queue: MoveRing<16>,
    pub planner: Planner,
    pub step_pins: [CountingPin; NUM_AXES],
    pub steps: Vec<StepEvent>,
    pub ticks: Vec<TickOutcome>,
    next_tick: u64,
}

impl Sim<NoEndstops> {
    pub fn new(config: &MachineConfig) -> Self {
        Self::with_endstops(config, NoEndstops)
    }
}

impl<E: EndstopInputs> Sim<E> {
    pub fn with_endstops(config: &MachineConfig, endstops: E) -> Self {
        Self::with_pins(config, Default::default(), endstops)
    }

    pub fn with_pins(config: &MachineConfig, step_pins: [CountingPin; NUM_AXES], endstops: E) -> Self {
        let constraints = MachineConstraints::from_config(config);
        let mut drivers = AxisDrivers::new(&constraints);
        for axis in Axis::ALL {
            if constraints.axis_enabled(axis) {
                drivers = drivers.with_axis(axis, step_pins[axis.index()].clone(), CountingPin::default());
            }
        }

        let shared = MotionShared::new();
        shared.set_debug(config.motion.debug);

        Self {
            constraints,
            shared,
            timer: SimTimer::default(),
            stepper: Stepper::new(constraints, drivers),
            clock: ClockHandler::new(constraints, endstops),
            queue: MoveRing::new(constraints),
            planner: Planner::new(constraints),
            step_pins,
            steps: Vec::new(),
            ticks: Vec::new(),
            next_tick: constraints.ticks_per_clock as u64,
        }
    }

    /// Plan and queue a move.
    pub fn push(&mut self, request: MoveRequest) -> Dda {
        let dda = self.planner.plan(&request, self.queue.last()).unwrap();
        self.queue.enqueue(dda).unwrap();
        dda
    }

    /// Queue an already planned move.
    pub fn push_planned(&mut self, dda: Dda) {
        self.queue.enqueue(dda).unwrap();
    }

    /// Start the first queued move.
    pub fn start(&mut self) {
        self.stepper
            .activate_next(&mut self.queue, &self.shared, &self.timer)
            .unwrap();
    }

    /// Process the next event. Returns false once idle with nothing queued.
    pub fn advance(&mut self) -> bool {
        if self.stepper.is_idle() && self.queue.is_empty() {
            return false;
        }

        match self.timer.due.get() {
            Some(due) if due <= self.next_tick => {
                self.timer.now.set(due);
                self.timer.due.set(None);
                let outcome = self
                    .stepper
                    .service(&mut self.queue, &self.shared, &self.timer)
                    .unwrap();
                self.steps.push(StepEvent { time: due, outcome });
            }
            _ => {
                self.timer.now.set(self.next_tick);
                self.next_tick += self.constraints.ticks_per_clock as u64;
                let outcome = self.clock.on_tick(&self.shared, &self.timer);
                self.ticks.push(outcome);
            }
        }
        true
    }

    /// Run until every queued move has finished.
    pub fn run(&mut self, time_limit: u64) {
        if self.stepper.is_idle() {
            self.start();
        }
        while self.advance() {
            assert!(self.timer.now.get() <= time_limit, "simulation ran past {}", time_limit);
        }
    }

    /// Run until the current move has taken `steps` dominant-axis steps.
    pub fn run_until_step(&mut self, steps: u32) {
        if self.stepper.is_idle() {
            self.start();
        }
        while self.stepper.state().map_or(false, |s| s.step_no < steps) {
            assert!(self.advance());
        }
    }

    pub fn pulses(&self) -> [u32; NUM_AXES] {
        let mut out = [0; NUM_AXES];
        for (n, pin) in out.iter_mut().zip(self.step_pins.iter()) {
            *n = pin.rises();
        }
        out
    }

    /// Intervals armed by the step handler after each step.
    pub fn step_intervals(&self) -> Vec<u32> {
        self.steps
            .iter()
            .filter_map(|e| match e.outcome {
                StepOutcome::Stepped { interval, .. } => Some(interval),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<StepOutcome> {
        self.steps
            .iter()
            .map(|e| e.outcome)
            .filter(|o| matches!(o, StepOutcome::Completed { .. }))
            .collect()
    }
}
