//! Integration tests for the exam session state machine.
//!
//! These tests drive [`ExamSession`] through complete exam lifecycles:
//!
//! - Timeout: the countdown submits the session at zero
//! - Termination: counting violations reach the threshold
//! - Advisory exclusion: fullscreen exits never terminate
//! - Idempotent submission from every source

use examguard_core::{
    ExamSession, MonitorConfig, SessionSnapshot, SessionState, SubmitReason, ViolationKind,
};

fn config(duration: u64, max_warnings: u32) -> MonitorConfig {
    MonitorConfig {
        exam_duration_secs: duration,
        max_warnings,
        ..MonitorConfig::default()
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_countdown_expiry_submits_with_timeout() {
    let mut session = ExamSession::new(&config(5, 3));
    for expected in (1..5).rev() {
        let outcome = session.tick();
        assert_eq!(outcome.transition, None);
        assert_eq!(session.remaining_secs(), expected);
        assert_eq!(session.state(), SessionState::Active);
    }

    let outcome = session.tick();
    assert_eq!(outcome.transition, Some(SubmitReason::Timeout));
    assert_eq!(session.state(), SessionState::Submitted);
    assert_eq!(session.reason(), Some(SubmitReason::Timeout));
    assert_eq!(session.status().formatted_time, "00:00");
}

#[test]
fn test_three_camera_violations_terminate() {
    let mut session = ExamSession::new(&config(2700, 3));

    let first = session.record_violation(ViolationKind::FaceMissing, "No face detected");
    let second = session.record_violation(ViolationKind::MultipleFaces, "2 faces detected");
    assert_eq!((first.warning_count, second.warning_count), (1, 2));
    assert_eq!(session.state(), SessionState::Active);

    let third = session.record_violation(ViolationKind::FaceMissing, "No face detected");
    assert!(third.accepted);
    assert_eq!(third.warning_count, 3);
    assert_eq!(session.state(), SessionState::Submitted);
    assert_eq!(session.reason(), Some(SubmitReason::Termination));
    assert_eq!(session.warning_count(), 3);

    let fourth = session.record_violation(ViolationKind::FaceMissing, "No face detected");
    assert!(!fourth.accepted);
    assert_eq!(session.ledger().len(), 3);
}

#[test]
fn test_fullscreen_exits_are_advisory() {
    let mut session = ExamSession::new(&config(2700, 3));
    for _ in 0..5 {
        let outcome =
            session.record_violation(ViolationKind::FullscreenExit, "Exited full-screen mode");
        assert!(outcome.accepted);
    }
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(session.warning_count(), 0);
    assert_eq!(session.ledger().len(), 5);
}

#[test]
fn test_double_user_submit_returns_identical_snapshot() {
    let mut session = ExamSession::new(&config(2700, 3));
    session.tick();
    session.answer(0, 2).unwrap();

    let first = session.request_submit(SubmitReason::User);
    let second = session.request_submit(SubmitReason::User);
    assert_eq!(first, second);
    assert_eq!(first.state, SessionState::Submitted);
    assert_eq!(first.reason, Some(SubmitReason::User));
    assert_eq!(first.remaining_secs, 2699);
    assert_eq!(first.attempted, 1);
}

// ============================================================================
// Cross-source idempotency
// ============================================================================

#[test]
fn test_first_submit_wins_across_sources() {
    let mut session = ExamSession::new(&config(2, 1));
    let terminal: SessionSnapshot = session.request_submit(SubmitReason::User);

    // Threshold violation and countdown expiry after the user submission are
    // both no-ops.
    session.record_violation(ViolationKind::FaceMissing, "No face detected");
    session.tick();
    session.tick();
    assert_eq!(session.request_submit(SubmitReason::Timeout), terminal);
    assert_eq!(session.snapshot(), terminal);
    assert_eq!(session.reason(), Some(SubmitReason::User));
    assert_eq!(session.warning_count(), 0);
}

#[test]
fn test_threshold_beats_later_timeout() {
    let mut session = ExamSession::new(&config(1, 1));
    let outcome = session.record_violation(ViolationKind::MultipleFaces, "3 faces detected");
    assert!(outcome.accepted);
    assert_eq!(session.tick().transition, None);
    assert_eq!(session.reason(), Some(SubmitReason::Termination));
    assert_eq!(session.remaining_secs(), 1);
}

#[test]
fn test_timer_monotonic_while_active() {
    let mut session = ExamSession::new(&config(30, 3));
    let mut previous = session.remaining_secs();
    for _ in 0..10 {
        session.record_violation(ViolationKind::FullscreenExit, "Exited full-screen mode");
        session.tick();
        assert_eq!(session.remaining_secs(), previous - 1);
        previous = session.remaining_secs();
    }
}
