//! Step generation tests: Bresenham exactness, ramp envelope, constant rate.

mod common;

use common::{machine, target, Sim};
use dda_motion::{MmPerMinute, MoveRequest, StepOutcome, StrategyKind};
use proptest::prelude::*;

const TIME_LIMIT: u64 = 120_000_000;

fn strategy() -> impl Strategy<Value = StrategyKind> {
    prop_oneof![
        Just(StrategyKind::Ramping),
        Just(StrategyKind::Clock),
        Just(StrategyKind::Temporal),
    ]
}

fn request() -> impl Strategy<Value = MoveRequest> {
    (
        -30_000i32..30_000,
        -30_000i32..30_000,
        -2_000i32..2_000,
        0i32..5_000,
        300u32..6_000,
    )
        .prop_map(|(x, y, z, e, feed)| MoveRequest::new(target(x, y, z, e), MmPerMinute(feed)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_axis_gets_exactly_its_planned_steps(
        strategy in strategy(),
        lookahead in any::<bool>(),
        requests in prop::collection::vec(request(), 1..4),
    ) {
        let mut config = machine(strategy);
        config.motion.lookahead = lookahead;
        let mut sim = Sim::new(&config);

        let mut expected = [0u32; 4];
        for request in &requests {
            if let Ok(dda) = sim.planner.plan(request, sim.queue.last()) {
                for (n, d) in expected.iter_mut().zip(dda.delta.iter()) {
                    *n += d.abs();
                }
                sim.push_planned(dda);
            }
        }
        prop_assume!(!sim.queue.is_empty());

        sim.run(TIME_LIMIT);

        prop_assert_eq!(sim.pulses(), expected);
        prop_assert_eq!(sim.stepper.position(), sim.planner.position_steps());
        let min = sim.constraints.min_interval.0;
        prop_assert!(sim.timer.arms.borrow().iter().all(|&t| t >= min));
    }

    #[test]
    fn ramp_intervals_fall_then_rise(
        distance in 1_000i32..60_000,
        feed in 100u32..6_000,
    ) {
        let mut sim = Sim::new(&machine(StrategyKind::Ramping));
        sim.push(MoveRequest::new(target(distance, 0, 0, 0), MmPerMinute(feed)));
        sim.run(TIME_LIMIT);

        let intervals = sim.step_intervals();
        prop_assume!(!intervals.is_empty());
        let lowest = intervals
            .iter()
            .enumerate()
            .min_by_key(|(_, &t)| t)
            .map(|(i, _)| i)
            .unwrap();

        prop_assert!(intervals[..=lowest].windows(2).all(|w| w[0] >= w[1]));
        prop_assert!(intervals[lowest..].windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn bresenham_minor_axis_is_evenly_spread() {
    let mut sim = Sim::new(&machine(StrategyKind::Ramping));
    // 1000 X steps, 300 Y steps
    sim.push(MoveRequest::new(target(10_000, 3_000, 0, 0), MmPerMinute(1200)));
    sim.start();

    for n in [1u32, 100, 333, 500, 999] {
        sim.run_until_step(n);
        let expected = (500 + n * 300) / 1000;
        assert_eq!(sim.pulses()[1], expected, "after {} dominant steps", n);
    }
}

fn constant_rate(strategy: StrategyKind) {
    let mut sim = Sim::new(&machine(strategy));
    let mut dda = sim
        .planner
        .plan(&MoveRequest::new(target(20_000, 0, 0, 0), MmPerMinute(3000)), None)
        .unwrap();
    let cruise = dda.cruise_rate;
    dda.set_start_rate(cruise, &sim.constraints);
    dda.set_end_rate(cruise, &sim.constraints);
    sim.push_planned(dda);
    sim.run(TIME_LIMIT);

    // 20 mm over 2000 steps at 1 MHz: 600_000 / 3000 mm/min
    let expected = (dda.rate_const / cruise.0 as u64) as u32;
    assert_eq!(expected, 200);
    let intervals = sim.step_intervals();
    assert_eq!(intervals.len(), 1999);
    assert!(intervals.iter().all(|&t| t == expected), "{:?}", &intervals[..10]);
    assert_eq!(*sim.timer.arms.borrow().first().unwrap(), expected);
}

#[test]
fn constant_rate_move_on_ramp_strategy() {
    constant_rate(StrategyKind::Ramping);
}

#[test]
fn constant_rate_move_on_clock_strategy() {
    constant_rate(StrategyKind::Clock);
}

#[test]
fn temporal_axes_finish_together() {
    let mut sim = Sim::new(&machine(StrategyKind::Temporal));
    sim.push(MoveRequest::new(target(8_000, 4_000, 0, 0), MmPerMinute(600)));
    sim.run(TIME_LIMIT);

    assert_eq!(sim.pulses(), [800, 400, 0, 0]);
    let last = sim.steps.last().unwrap();
    assert!(matches!(last.outcome, StepOutcome::Completed { truncated: false, .. }));
    // 8.94 mm at 600 mm/min is just under 0.9 s
    assert!(last.time <= 895_000, "finished at {}", last.time);
}
