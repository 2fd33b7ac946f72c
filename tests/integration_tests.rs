//! Integration tests for dda-motion.
//!
//! These tests verify the complete workflow from TOML parsing to move execution.

mod common;

use common::{machine, target, Sim};
use dda_motion::error::ConfigError;
use dda_motion::{
    load_config, parse_config, Axis, Error, MachineConstraints, MmPerMinute, MoveRequest, StepOutcome,
    StrategyKind, TimerTicks,
};

// =============================================================================
// Test configuration data
// =============================================================================

const MINIMAL_CONFIG: &str = r#"
[motion]
acceleration_mm_per_s2 = 500

[axes.x]
steps_per_m = 80000
max_feedrate_mm_per_min = 12000
"#;

const FULL_CONFIG: &str = r#"
[motion]
strategy = "clock"
timer_frequency_hz = 1000000
clock_period_ms = 1
acceleration_mm_per_s2 = 1000
min_step_interval_ticks = 100
endstop_debounce_ticks = 2
max_jerk_mm_per_min = 300
lookahead = true
debug = true

[axes.x]
steps_per_m = 100000
max_feedrate_mm_per_min = 6000
invert_direction = true

[axes.y]
steps_per_m = 100000
max_feedrate_mm_per_min = 6000
endstop_active_high = false

[axes.z]
steps_per_m = 400000
max_feedrate_mm_per_min = 600
"#;

const TIME_LIMIT: u64 = 120_000_000;

// =============================================================================
// Configuration parsing and validation
// =============================================================================

#[test]
fn parse_minimal_config_uses_defaults() {
    let config = parse_config(MINIMAL_CONFIG).expect("Should parse minimal config");

    assert_eq!(config.motion.strategy, StrategyKind::Ramping);
    assert_eq!(config.motion.timer_frequency_hz, 16_000_000);
    assert_eq!(config.motion.clock_period_ms, 2);
    assert_eq!(config.motion.min_step_interval, TimerTicks(200));
    assert!(!config.motion.lookahead);

    let axes: Vec<_> = config.enabled_axes().collect();
    assert_eq!(axes, [Axis::X]);
}

#[test]
fn parse_full_config_derives_constraints() {
    let config = parse_config(FULL_CONFIG).expect("Should parse full config");
    let constraints = MachineConstraints::from_config(&config);

    assert_eq!(constraints.strategy, StrategyKind::Clock);
    assert_eq!(constraints.ticks_per_clock, 1000);
    // 1000 mm/s² for 1 ms is 60 mm/min per tick
    assert_eq!(constraints.accel_per_clock, 60);
    assert_eq!(constraints.max_jerk, MmPerMinute(300));
    assert_eq!(constraints.endstop_debounce, 2);
    assert!(constraints.lookahead);
    assert!(constraints.invert_direction[Axis::X.index()]);
    assert!(!constraints.endstop_active_high[Axis::Y.index()]);
    assert!(!constraints.axis_enabled(Axis::E));
}

#[test]
fn invalid_configs_are_rejected() {
    let no_feedrate = r#"
[motion]
acceleration_mm_per_s2 = 500

[axes.y]
steps_per_m = 80000
"#;
    assert_eq!(
        parse_config(no_feedrate).unwrap_err(),
        Error::Config(ConfigError::InvalidMaxFeedrate(Axis::Y))
    );

    let zero_period = r#"
[motion]
acceleration_mm_per_s2 = 500
clock_period_ms = 0
"#;
    assert_eq!(
        parse_config(zero_period).unwrap_err(),
        Error::Config(ConfigError::InvalidClockPeriod(0))
    );

    let unknown_strategy = r#"
[motion]
acceleration_mm_per_s2 = 500
strategy = "magic"
"#;
    assert!(matches!(
        parse_config(unknown_strategy),
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}

#[test]
fn load_config_from_file() {
    let path = std::env::temp_dir().join(format!("dda-motion-{}.toml", std::process::id()));
    std::fs::write(&path, FULL_CONFIG).unwrap();
    let loaded = load_config(&path);
    std::fs::remove_file(&path).unwrap();

    let config = loaded.expect("Should load config from file");
    assert_eq!(config.motion.strategy, StrategyKind::Clock);

    assert!(matches!(
        load_config("/nonexistent/machine.toml"),
        Err(Error::Config(ConfigError::IoError(_)))
    ));
}

// =============================================================================
// Configuration to execution
// =============================================================================

#[test]
fn parsed_config_runs_a_square() {
    let config = parse_config(FULL_CONFIG).unwrap();
    let mut sim = Sim::new(&config);
    assert!(sim.shared.debug());

    for (x, y) in [(5_000, 0), (5_000, 5_000), (0, 5_000), (0, 0)] {
        sim.push(MoveRequest::new(target(x, y, 0, 0), MmPerMinute(3000)));
    }
    sim.run(TIME_LIMIT);

    assert_eq!(sim.pulses(), [1000, 1000, 0, 0]);
    assert_eq!(sim.stepper.position(), sim.planner.position_steps());
    assert_eq!(sim.completions().len(), 4);
    assert_eq!(sim.queue.last_completed(), Some(dda_motion::MoveId(3)));
}

// =============================================================================
// Look-ahead joining through the queue
// =============================================================================

fn two_collinear_moves(lookahead: bool) -> Sim {
    let mut config = machine(StrategyKind::Ramping);
    config.motion.lookahead = lookahead;
    let mut sim = Sim::new(&config);
    sim.push(MoveRequest::new(target(20_000, 0, 0, 0), MmPerMinute(3000)));
    sim.push(MoveRequest::new(target(60_000, 0, 0, 0), MmPerMinute(3000)));
    sim
}

#[test]
fn joined_moves_cross_at_speed() {
    let sim = two_collinear_moves(true);
    let last = sim.queue.last().unwrap();
    let join = last.join.expect("straight continuation should be joined");
    assert_eq!(join.speed, MmPerMinute(3000));
    assert_eq!(last.start_rate, MmPerMinute(3000));

    let mut joined = sim;
    joined.run(TIME_LIMIT);
    let mut stopped = two_collinear_moves(false);
    stopped.run(TIME_LIMIT);

    assert_eq!(joined.pulses(), [6000, 0, 0, 0]);
    assert_eq!(stopped.pulses(), [6000, 0, 0, 0]);
    let finish = |sim: &Sim| sim.steps.last().unwrap().time;
    assert!(finish(&joined) < finish(&stopped));
}

#[test]
fn stale_join_starts_from_rest() {
    let mut config = machine(StrategyKind::Ramping);
    config.motion.lookahead = true;
    let mut sim = Sim::new(&config);

    let first = sim.push(MoveRequest::new(target(20_000, 0, 0, 0), MmPerMinute(3000)));
    let second = sim
        .planner
        .plan(&MoveRequest::new(target(40_000, 0, 0, 0), MmPerMinute(3000)), Some(&first))
        .unwrap();
    assert!(second.join.is_some());

    // the first move is already executing when the second arrives
    sim.start();
    sim.push_planned(second);

    let queued = sim.queue.last().unwrap();
    assert!(queued.join.is_none());
    assert_eq!(queued.start_rate, MmPerMinute(0));

    sim.run(TIME_LIMIT);
    assert_eq!(sim.pulses(), [4000, 0, 0, 0]);
    assert!(sim
        .completions()
        .iter()
        .all(|c| matches!(c, StepOutcome::Completed { truncated: false, .. })));
}
