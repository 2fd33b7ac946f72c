//! Endstop-terminated moves.

mod common;

use common::{machine, target, CountingPin, PulseSwitch, Sim};
use dda_motion::{Axis, AxisMask, MmPerMinute, MoveRequest, StepOutcome, StrategyKind};

const TIME_LIMIT: u64 = 60_000_000;

fn homing_sim(strategy: StrategyKind, at: u32) -> Sim<PulseSwitch> {
    let pins: [CountingPin; 4] = Default::default();
    let switch = PulseSwitch {
        axis: Axis::X,
        pin: pins[0].clone(),
        at,
    };
    let mut sim = Sim::with_pins(&machine(strategy), pins, switch);
    // 1000 X steps, 500 Y steps, about 11 ms per dominant step
    sim.push(
        MoveRequest::new(target(10_000, 5_000, 0, 0), MmPerMinute(60)).with_endstops(AxisMask::of(Axis::X)),
    );
    sim
}

#[test]
fn endstop_truncates_at_step_boundary() {
    let mut sim = homing_sim(StrategyKind::Ramping, 400);
    sim.run(TIME_LIMIT);

    assert_eq!(sim.pulses(), [400, 200, 0, 0]);
    assert_eq!(
        sim.completions()[..],
        [StepOutcome::Completed {
            id: dda_motion::MoveId(0),
            truncated: true,
            skew: None,
        }]
    );
    let d = sim.shared.diagnostics();
    assert_eq!(d.endstop_stops, 1);
    assert_eq!(d.moves_completed, 1);
}

#[test]
fn endstop_stop_on_clock_strategy_has_no_skew() {
    let mut sim = homing_sim(StrategyKind::Clock, 250);
    sim.run(TIME_LIMIT);

    let pulses = sim.pulses();
    assert!((250..=251).contains(&pulses[0]), "{:?}", pulses);
    assert!(matches!(
        sim.completions()[..],
        [StepOutcome::Completed {
            truncated: true,
            skew: None,
            ..
        }]
    ));
    assert_eq!(sim.shared.diagnostics().undershoots, 0);
}

#[test]
fn switch_is_ignored_without_endstop_mask() {
    let pins: [CountingPin; 4] = Default::default();
    let switch = PulseSwitch {
        axis: Axis::X,
        pin: pins[0].clone(),
        at: 10,
    };
    let mut sim = Sim::with_pins(&machine(StrategyKind::Ramping), pins, switch);
    sim.push(MoveRequest::new(target(2_000, 0, 0, 0), MmPerMinute(600)));
    sim.run(TIME_LIMIT);

    assert_eq!(sim.pulses()[0], 200);
    assert_eq!(sim.shared.diagnostics().endstop_stops, 0);
}

#[test]
fn stop_request_does_not_leak_into_next_move() {
    let mut sim = homing_sim(StrategyKind::Ramping, 400);
    sim.push(MoveRequest::new(target(12_000, 5_000, 0, 0), MmPerMinute(600)));
    sim.run(TIME_LIMIT);

    // the planner assumed the homing move finished; the follow-up still runs
    // its full 200 X steps after the truncated one
    assert_eq!(sim.pulses()[0], 600);
    let completions = sim.completions();
    assert_eq!(completions.len(), 2);
    assert!(matches!(completions[1], StepOutcome::Completed { truncated: false, .. }));
}

#[test]
fn planner_resyncs_after_truncated_move() {
    let mut sim = homing_sim(StrategyKind::Ramping, 400);
    sim.run(TIME_LIMIT);

    // planned for the full move, executed 400 of 1000 X steps
    assert_ne!(sim.planner.position_steps(), sim.stepper.position());
    sim.planner.sync_steps(sim.stepper.position()).unwrap();
    assert_eq!(sim.planner.position_steps(), sim.stepper.position());
    assert_eq!(sim.planner.position(), target(4_000, 2_000, 0, 0));

    // a follow-up to the original target covers what the stop skipped
    sim.push(MoveRequest::new(target(10_000, 5_000, 0, 0), MmPerMinute(600)));
    sim.run(TIME_LIMIT);
    assert_eq!(sim.pulses(), [1000, 500, 0, 0]);
    assert_eq!(sim.stepper.position(), sim.planner.position_steps());
}
