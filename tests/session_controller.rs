mod common;

use common::{harness, harness_with_config, Read, ScriptedClassifier, ScriptedSource};
use face_gate::capture::{Overlay, SessionConfig, SyntheticSource, STUB_OFFLINE_URI};
use face_gate::recognition::{FixedClassifier, Identity};
use face_gate::session::{
    HostContext, Phase, SessionController, SessionState, Status, TickOutcome, STREAM_PLACEHOLDER,
};
use std::time::Duration;

#[test]
fn unreachable_camera_leaves_session_idle() {
    let context = HostContext::new();
    let mut controller = SessionController::new(
        STUB_OFFLINE_URI,
        SessionConfig::default(),
        SyntheticSource::new(),
        FixedClassifier::rejecting(),
        context,
        || {},
    );

    controller.start_recognition();

    assert_eq!(controller.status(), &Status::CameraUnavailable);
    assert_eq!(
        controller.status().to_string(),
        "Error: Unable to access camera."
    );
    assert_eq!(controller.phase(), Phase::Idle);
    assert!(!controller.pump_armed());
    assert!(!controller.source_open());
    assert_eq!(controller.stats().open_failures, 1);
    assert_eq!(controller.tick(), TickOutcome::Skipped);
}

#[test]
fn refused_open_never_reads() {
    let mut h = harness(ScriptedSource::refusing(), ScriptedClassifier::never());

    h.controller.activate();
    for _ in 0..3 {
        assert_eq!(h.controller.tick(), TickOutcome::Skipped);
    }

    let log = h.source.log.lock().unwrap();
    assert_eq!(log.reads, 0);
    assert_eq!(log.reads_while_closed, 0);
}

#[test]
fn ten_rejected_frames_keep_streaming() {
    let mut h = harness(ScriptedSource::new(), ScriptedClassifier::never());
    h.controller.activate();

    for _ in 0..10 {
        assert_eq!(h.controller.tick(), TickOutcome::Displayed);
    }

    assert_eq!(h.view.frames_shown(), 10);
    assert_eq!(h.controller.phase(), Phase::Streaming);
    assert_eq!(h.controller.identity(), &Identity::unknown());
    assert!(h.context.current_user().is_unknown());
    assert!(h.source.is_open_now());
    assert!(h.controller.pump_armed());
    assert_eq!(h.controller.stats().frames_processed, 10);
}

#[test]
fn authorization_applies_all_side_effects_in_one_tick() {
    let mut h = harness(
        ScriptedSource::new(),
        ScriptedClassifier::authorizing_on("Alice", &[4]),
    );
    h.controller.activate();

    for _ in 0..3 {
        assert_eq!(h.controller.tick(), TickOutcome::Displayed);
    }
    let outcome = h.controller.tick();

    assert_eq!(outcome, TickOutcome::Authorized(Identity::new("Alice")));
    assert_eq!(h.controller.phase(), Phase::Authorized);
    assert!(!h.controller.pump_armed());
    assert!(!h.source.is_open_now());
    assert_eq!(h.controller.identity().as_str(), "Alice");
    assert_eq!(h.context.current_user().as_str(), "Alice");
    assert!(h.controller.status().to_string().contains("Alice"));
    assert_eq!(
        h.controller.status().to_string(),
        "Authorization done for Alice.... Redirecting..."
    );

    // The authorizing frame was still displayed.
    assert_eq!(h.view.frames_shown(), 4);

    let SessionState::Authorized { since, .. } = h.controller.state().clone() else {
        panic!("expected Authorized, got {:?}", h.controller.state());
    };
    assert_eq!(
        h.controller.handoff_deadline(),
        Some(since + Duration::from_millis(2000))
    );

    // No further reads happen once authorized.
    let reads = h.source.reads();
    assert_eq!(h.controller.tick(), TickOutcome::Skipped);
    assert_eq!(h.source.reads(), reads);
    assert_eq!(h.source.log.lock().unwrap().reads_while_closed, 0);
}

#[test]
fn handoff_switches_once_then_resets() {
    let mut h = harness(
        ScriptedSource::new(),
        ScriptedClassifier::authorizing_on("Alice", &[1]),
    );
    h.controller.activate();
    h.controller.tick();

    assert!(h.controller.complete_handoff());
    assert_eq!(h.switches.count(), 1);
    assert_eq!(h.controller.phase(), Phase::Idle);
    assert_eq!(h.controller.status(), &Status::WaitingForAuthorization);
    assert!(h.controller.handoff_deadline().is_none());
    assert!(!h.source.is_open_now());

    // Identity survives the reset, both locally and for the successor screen.
    assert_eq!(h.controller.identity().as_str(), "Alice");
    assert_eq!(h.context.current_user().as_str(), "Alice");

    assert!(!h.controller.complete_handoff());
    assert_eq!(h.switches.count(), 1);
    assert_eq!(h.controller.stats().handoffs, 1);
}

#[test]
fn reset_during_grace_period_cancels_handoff() {
    let mut h = harness(
        ScriptedSource::new(),
        ScriptedClassifier::authorizing_on("Alice", &[2]),
    );
    h.controller.activate();
    h.controller.tick();
    h.controller.tick();
    assert_eq!(h.controller.phase(), Phase::Authorized);

    h.controller.reset();

    assert!(h.controller.handoff_deadline().is_none());
    assert!(!h.controller.complete_handoff());
    assert_eq!(h.switches.count(), 0);
    assert_eq!(h.controller.phase(), Phase::Idle);
}

#[test]
fn start_is_ignored_while_authorized() {
    let mut h = harness(
        ScriptedSource::new(),
        ScriptedClassifier::authorizing_on("Alice", &[1]),
    );
    h.controller.activate();
    h.controller.tick();
    let opens = h.source.log.lock().unwrap().opens;

    h.controller.start_recognition();

    assert_eq!(h.controller.phase(), Phase::Authorized);
    assert!(!h.controller.pump_armed());
    assert!(!h.source.is_open_now());
    assert_eq!(h.source.log.lock().unwrap().opens, opens);
}

#[test]
fn stop_and_reset_are_idempotent() {
    let mut h = harness(ScriptedSource::new(), ScriptedClassifier::never());
    h.controller.activate();
    h.controller.tick();

    h.controller.reset();
    let once = h.controller.snapshot();
    let statuses = h.view.log.lock().unwrap().statuses.len();

    h.controller.reset();
    h.controller.stop();
    h.controller.reset();

    assert_eq!(h.controller.snapshot(), once);
    assert_eq!(h.controller.phase(), Phase::Idle);
    assert!(!h.controller.pump_armed());
    assert!(h.controller.handoff_deadline().is_none());
    assert!(!h.source.is_open_now());
    assert_eq!(h.source.log.lock().unwrap().closes, 1);
    // The status did not change again, so the view was not told twice.
    assert_eq!(h.view.log.lock().unwrap().statuses.len(), statuses);
}

#[test]
fn reset_restores_placeholder_and_status() {
    let mut h = harness(ScriptedSource::new(), ScriptedClassifier::never());
    h.controller.activate();
    h.controller.reset();

    let log = h.view.log.lock().unwrap();
    assert_eq!(log.placeholders.last().map(String::as_str), Some(STREAM_PLACEHOLDER));
    assert_eq!(h.controller.status(), &Status::WaitingForAuthorization);
}

#[test]
fn fps_readout_is_drawn_near_top_right() {
    let mut h = harness(ScriptedSource::new(), ScriptedClassifier::never());
    h.controller.activate();
    h.controller.tick();

    let frame = h.view.last_frame().unwrap();
    assert_eq!(
        frame.overlays().last(),
        Some(&Overlay::Text {
            text: "FPS: 25.0".into(),
            x: 320 - 150,
            y: 30,
        })
    );
    assert_eq!(h.controller.stats().last_fps, 25.0);
}

#[test]
fn read_failure_reports_status_and_keeps_pumping() {
    let mut h = harness(
        ScriptedSource::with_script([Read::Fail, Read::Fail, Read::Frame]),
        ScriptedClassifier::never(),
    );
    h.controller.activate();

    assert_eq!(h.controller.tick(), TickOutcome::ReadFailed);
    assert_eq!(h.controller.status().to_string(), "Error: Failed to read frame.");
    assert_eq!(h.controller.tick(), TickOutcome::ReadFailed);
    assert_eq!(
        h.controller.state(),
        &SessionState::Streaming {
            consecutive_failures: 2
        }
    );
    assert!(h.controller.pump_armed());
    assert!(h.source.is_open_now());

    assert_eq!(h.controller.tick(), TickOutcome::Displayed);
    assert_eq!(h.controller.state(), &SessionState::streaming());
    assert_eq!(h.controller.stats().read_failures, 2);
    assert_eq!(h.view.frames_shown(), 1);
}

#[test]
fn persistent_read_failures_give_up_on_stream() {
    let config = SessionConfig {
        max_consecutive_read_failures: 3,
        ..SessionConfig::default()
    };
    let mut h = harness_with_config(
        ScriptedSource::with_script([Read::Fail; 5]),
        ScriptedClassifier::never(),
        config,
    );
    h.controller.activate();

    assert_eq!(h.controller.tick(), TickOutcome::ReadFailed);
    assert_eq!(h.controller.tick(), TickOutcome::ReadFailed);
    assert_eq!(h.controller.tick(), TickOutcome::StreamLost);

    assert_eq!(h.controller.phase(), Phase::Idle);
    assert_eq!(h.controller.status(), &Status::StreamLost);
    assert!(!h.source.is_open_now());
    assert!(!h.controller.pump_armed());
    assert_eq!(h.controller.tick(), TickOutcome::Skipped);

    // A manual start reconnects.
    h.controller.start_recognition();
    assert_eq!(h.controller.phase(), Phase::Streaming);
    assert_eq!(h.source.log.lock().unwrap().opens, 2);
}

#[test]
fn zero_failure_limit_retries_forever() {
    let config = SessionConfig {
        max_consecutive_read_failures: 0,
        ..SessionConfig::default()
    };
    let mut h = harness_with_config(
        ScriptedSource::with_script([Read::Fail; 200]),
        ScriptedClassifier::never(),
        config,
    );
    h.controller.activate();

    for _ in 0..200 {
        assert_eq!(h.controller.tick(), TickOutcome::ReadFailed);
    }
    assert_eq!(h.controller.phase(), Phase::Streaming);
}

#[test]
fn activate_restarts_pump_without_reopening_twice() {
    let mut h = harness(ScriptedSource::new(), ScriptedClassifier::never());

    h.controller.activate();
    let generation = h.controller.pump_generation();
    h.controller.start_recognition();

    assert!(h.controller.pump_generation() > generation);
    assert_eq!(h.source.log.lock().unwrap().opens, 1);

    h.controller.activate();
    let log = h.source.log.lock().unwrap();
    assert_eq!(log.opens, 2);
    assert_eq!(log.closes, 1);
}

#[test]
fn dropping_controller_releases_camera() {
    let h = harness(ScriptedSource::new(), ScriptedClassifier::never());
    let source = h.source.clone();
    let mut controller = h.controller;
    controller.activate();
    assert!(source.is_open_now());

    drop(controller);
    assert!(!source.is_open_now());
}

#[test]
fn synthetic_stream_end_counts_as_read_failure() {
    let context = HostContext::new();
    let mut controller = SessionController::new(
        "stub://camera",
        SessionConfig::default(),
        SyntheticSource::new().with_frame_limit(2),
        FixedClassifier::rejecting(),
        context,
        || {},
    );
    controller.activate();

    assert_eq!(controller.tick(), TickOutcome::Displayed);
    assert_eq!(controller.tick(), TickOutcome::Displayed);
    assert_eq!(controller.tick(), TickOutcome::ReadFailed);
}
