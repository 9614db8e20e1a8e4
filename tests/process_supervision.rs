// tests/process_supervision.rs
#![cfg(unix)]

mod common;

use std::time::{Duration, Instant};

use buildwatch::errors::BuildwatchError;
use buildwatch::exec::{ManagedProcess, ProcessSpec, ProcessState};

fn sh(script: &str) -> ProcessSpec {
    ProcessSpec::new("sh", vec!["-c".to_string(), script.to_string()], ".")
}

#[tokio::test]
async fn stop_on_exited_process_returns_immediately() {
    common::init_tracing();
    let mut process = ManagedProcess::start(&sh("exit 3")).unwrap();

    let exit = common::with_timeout(process.wait_stopped()).await;
    assert_eq!(exit.code, Some(3));
    assert_eq!(process.state(), ProcessState::Stopped);

    let started = Instant::now();
    let exit = process.stop(Duration::from_secs(30)).await;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(exit.code, Some(3));
    assert!(!exit.success);
}

#[tokio::test]
async fn stop_after_unobserved_exit_does_not_signal_again() {
    common::init_tracing();
    let mut process = ManagedProcess::start(&sh("exit 7")).unwrap();

    // Let the wait task reap the child without anyone awaiting it.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(process.has_exited());

    let started = Instant::now();
    let exit = process.stop(Duration::from_secs(30)).await;
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(exit.code, Some(7));
    assert_eq!(process.state(), ProcessState::Stopped);
}

#[tokio::test]
async fn stop_terminates_cooperative_process_within_grace() {
    common::init_tracing();
    let mut process =
        ManagedProcess::start(&ProcessSpec::new("sleep", vec!["30".to_string()], ".")).unwrap();
    assert_eq!(process.state(), ProcessState::Running);
    assert!(process.id().is_some());

    let started = Instant::now();
    let exit = process.stop(Duration::from_secs(5)).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!exit.success);
    assert!(process.has_exited());
    assert_eq!(process.state(), ProcessState::Stopped);
}

#[tokio::test]
async fn stop_force_kills_process_ignoring_terminate_after_grace() {
    common::init_tracing();
    let mut process =
        ManagedProcess::start(&sh("trap '' TERM; while :; do sleep 0.1; done")).unwrap();
    // Let the shell install its trap.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!process.has_exited());

    let grace = Duration::from_millis(500);
    let started = Instant::now();
    let exit = common::with_timeout(process.stop(grace)).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= grace, "killed too early: {elapsed:?}");
    assert!(elapsed < grace + Duration::from_secs(2), "killed too late: {elapsed:?}");
    assert_eq!(exit.code, None);
    assert!(!exit.success);
    assert_eq!(process.state(), ProcessState::Stopped);
}

#[tokio::test]
async fn wait_with_grace_times_out_on_running_process() {
    let mut process =
        ManagedProcess::start(&ProcessSpec::new("sleep", vec!["30".to_string()], ".")).unwrap();

    let result = process.wait_with_grace(Duration::from_millis(100)).await;
    match result {
        Err(BuildwatchError::ProcessStopTimeout { pid, grace }) => {
            assert_eq!(pid, process.id());
            assert_eq!(grace, Duration::from_millis(100));
        }
        other => panic!("Expected ProcessStopTimeout, got: {:?}", other),
    }

    process.force_kill();
    common::with_timeout(process.wait_stopped()).await;
}

#[tokio::test]
async fn start_reports_launch_error_for_missing_program() {
    let spec = ProcessSpec::new("buildwatch-no-such-program", vec![], ".");

    let result = ManagedProcess::start(&spec);

    match result {
        Err(BuildwatchError::Launch { program, .. }) => {
            assert_eq!(program, "buildwatch-no-such-program");
        }
        other => panic!("Expected Launch error, got: {:?}", other),
    }
}
