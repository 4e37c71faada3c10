//! End-to-end runs through the master: parse, bootstrap, schedule.

use shadow_core::{Configuration, JsonScenarioParser, Master, MasterError, Phase, RunMode};
use shadow_env::{SIMTIME_MAX, SIMTIME_ONE_MILLISECOND};
use std::path::PathBuf;

const SCENARIO: &str = r#"{
  "actions": [
    { "action": "create_network", "id": 10 },
    { "action": "create_network", "id": 20 },
    { "action": "connect_network", "src": 10, "dst": 10, "latency_ms": 10.0 },
    { "action": "connect_network", "src": 20, "dst": 20, "latency_ms": 15.0, "reliability": 0.9 },
    { "action": "connect_network", "src": 10, "dst": 20, "latency_ms": 40.0, "reliability": 0.8 },
    { "action": "create_node", "name": "relay", "network": 10, "quantity": 3 },
    { "action": "create_node", "name": "edge", "network": 20, "quantity": 4 },
    { "action": "create_application", "node": "relay1", "peer": "edge1", "packets": 120, "interval_ms": 3, "echo": true },
    { "action": "create_application", "node": "relay2", "peer": "relay3", "packets": 80, "interval_ms": 2, "echo": true },
    { "action": "create_application", "node": "edge2", "peer": "edge3", "start_ms": 7, "packets": 90, "interval_ms": 1, "echo": false },
    { "action": "create_application", "node": "edge4", "peer": "relay1", "start_ms": 50, "packets": 60, "interval_ms": 6, "echo": true },
    { "action": "create_application", "node": "relay3", "peer": "edge4", "start_ms": 1, "packets": 30, "interval_ms": 11, "echo": false },
    { "action": "kill", "time_ms": 750 }
  ]
}"#;

fn write_scenario(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("shadow-core-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn run_with_workers(workers: usize, input: PathBuf) -> shadow_core::RunReport {
    let mut master = Master::new(Configuration {
        random_seed: 1234,
        workers,
        min_run_ahead: 10,
        input_files: vec![input],
        ..Default::default()
    });
    let report = master.run(&mut JsonScenarioParser::new()).unwrap();
    assert!(master.is_killed());
    assert_eq!(master.phase(), Phase::Killed);
    report
}

#[test]
fn test_serial_and_parallel_reach_same_state() {
    let input = write_scenario("determinism.json", SCENARIO);

    let serial = run_with_workers(0, input.clone());
    let parallel = run_with_workers(4, input);

    assert_eq!(serial.mode, RunMode::Serial);
    assert_eq!(parallel.mode, RunMode::Parallel { workers: 4 });
    assert_eq!(serial.late_events, 0);
    assert_eq!(parallel.late_events, 0);

    assert!(serial.events_processed > 0);
    assert!(serial.packets_received() > 0);
    assert_eq!(serial.nodes.len(), 7);
    assert!(serial.same_final_state(&parallel));

    // Traffic dies out before the 750ms kill time, at 10ms per window
    assert!(parallel.windows > 1 && parallel.windows <= 75);
    assert_eq!(serial.windows, 1);
}

#[test]
fn test_same_seed_is_reproducible() {
    let input = write_scenario("repeat.json", SCENARIO);

    let first = run_with_workers(3, input.clone());
    let second = run_with_workers(3, input);

    assert_eq!(first, second);
}

#[test]
fn test_bad_second_file_aborts_run() {
    let good = write_scenario("good.json", SCENARIO);
    let bad = write_scenario("bad.json", r#"{ "actions": [ { "action": "create_node" "#);

    let mut master = Master::new(Configuration {
        workers: 3,
        input_files: vec![good, bad.clone()],
        ..Default::default()
    });
    let mut parser = JsonScenarioParser::new();

    let err = master.run(&mut parser).unwrap_err();

    match err {
        MasterError::Parse { origin, .. } => assert_eq!(origin, bad.display().to_string()),
        other => panic!("expected parse error, got {other:?}"),
    }
    assert_eq!(parser.documents_parsed(), 1);
    assert_eq!(master.phase(), Phase::Parsing);
    // The window was never opened
    assert_eq!(master.execute_window_end(), 0);
}

#[test]
fn test_missing_file_is_parse_failure() {
    let mut master = Master::new(Configuration {
        input_files: vec![PathBuf::from("/nonexistent/shadow/input.json")],
        ..Default::default()
    });

    let err = master.run(&mut JsonScenarioParser::new()).unwrap_err();
    assert!(matches!(err, MasterError::Parse { .. }));
}

#[test]
fn test_builtin_example_runs_in_both_modes() {
    let run = |workers| {
        let mut master = Master::new(Configuration {
            workers,
            run_file_example: true,
            ..Default::default()
        });
        let report = master.run(&mut JsonScenarioParser::new()).unwrap();
        (report, master.execute_window_end())
    };

    let (serial, serial_end) = run(0);
    let (parallel, parallel_end) = run(2);

    assert_eq!(serial_end, SIMTIME_MAX);
    assert!(parallel_end <= 2000 * SIMTIME_ONE_MILLISECOND);
    assert_eq!(serial.end_time, 2000 * SIMTIME_ONE_MILLISECOND);
    assert!(serial.same_final_state(&parallel));
}

/// Two peers on one network whose only path (2ms) is faster than the
/// default 10ms run-ahead.
const FAST_PATH_SCENARIO: &str = r#"{
  "actions": [
    { "action": "create_network", "id": 1 },
    { "action": "connect_network", "src": 1, "dst": 1, "latency_ms": 2.0 },
    { "action": "create_node", "name": "peer", "network": 1, "quantity": 2 },
    { "action": "create_application", "node": "peer1", "peer": "peer2", "packets": 20, "interval_ms": 3, "echo": true },
    { "action": "create_application", "node": "peer2", "peer": "peer1", "packets": 20, "interval_ms": 3, "echo": true },
    { "action": "kill", "time_ms": 200 }
  ]
}"#;

fn fast_path_master(workers: usize, strict_run_ahead: bool, input: PathBuf) -> Master {
    Master::new(Configuration {
        workers,
        strict_run_ahead,
        input_files: vec![input],
        ..Default::default()
    })
}

#[test]
fn test_wide_run_ahead_runs_and_counts_late_events() {
    let input = write_scenario("fast_path_lenient.json", FAST_PATH_SCENARIO);

    let serial = fast_path_master(0, false, input.clone())
        .run(&mut JsonScenarioParser::new())
        .unwrap();
    let mut master = fast_path_master(2, false, input);
    let parallel = master.run(&mut JsonScenarioParser::new()).unwrap();

    assert_eq!(serial.late_events, 0);
    assert!(parallel.late_events > 0);
    assert_eq!(parallel.mode, RunMode::Parallel { workers: 2 });
    assert!(parallel.packets_received() > 0);
    assert_eq!(master.phase(), Phase::Killed);
}

#[test]
fn test_strict_run_ahead_rejects_fast_path() {
    let input = write_scenario("fast_path_strict.json", FAST_PATH_SCENARIO);

    let mut master = fast_path_master(2, true, input.clone());
    let err = master.run(&mut JsonScenarioParser::new()).unwrap_err();

    match err {
        MasterError::RunAhead { jump, min_latency } => {
            assert_eq!(jump, 10 * SIMTIME_ONE_MILLISECOND);
            assert_eq!(min_latency, 2 * SIMTIME_ONE_MILLISECOND);
        }
        other => panic!("expected run-ahead error, got {other:?}"),
    }
    // The first window was never opened
    assert_eq!(master.execute_window_end(), 0);

    // Serial runs have no window to check
    let serial = fast_path_master(0, true, input)
        .run(&mut JsonScenarioParser::new())
        .unwrap();
    assert!(serial.events_processed > 0);
}
