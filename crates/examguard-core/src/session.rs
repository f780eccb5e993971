//! Exam session state machine.
//!
//! [`ExamSession`] owns the canonical session state, the violation ledger, the
//! countdown and the answer sheet. Every mutation goes through
//! [`ExamSession::dispatch`], so whoever serializes calls into the session
//! (the daemon's session actor) resolves every race between producers.
//!
//! # State Machine
//!
//! ```text
//!            tick reaches 0 (Timeout)
//!            warning threshold (Termination)
//!            user confirmation (User)
//!   Active ─────────────────────────────────► Submitted (terminal)
//! ```
//!
//! The first submit request wins. Every later request, from any source, is a
//! no-op that returns the snapshot frozen at the moment of the transition.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::answers::AnswerSheet;
use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::countdown::{Countdown, TickOutcome, format_time};
use crate::error::SessionError;
use crate::ledger::{RecordOutcome, ViolationLedger};
use crate::notification::Notification;
use crate::policy::{EscalationPolicy, PolicyDecision};
use crate::violation::{Violation, ViolationKind};

// =============================================================================
// States and Reasons
// =============================================================================

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// The exam is in progress.
    Active,
    /// The exam has been submitted. Terminal.
    Submitted,
}

impl SessionState {
    /// Returns `true` for [`SessionState::Active`].
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Submitted => write!(f, "submitted"),
        }
    }
}

/// Why a session was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitReason {
    /// The candidate confirmed submission.
    User,
    /// The countdown reached zero.
    Timeout,
    /// The warning count reached the maximum.
    Termination,
}

impl SubmitReason {
    /// Returns the reason as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Timeout => "timeout",
            Self::Termination => "termination",
        }
    }

    /// Wording of the one confirmation shown on submission.
    #[must_use]
    pub const fn confirmation_message(&self) -> &'static str {
        match self {
            Self::User => "Exam submitted successfully.",
            Self::Timeout => "Time's up! Your exam has been submitted automatically.",
            Self::Termination => "Exam terminated due to repeated integrity violations.",
        }
    }
}

impl fmt::Display for SubmitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Events and Projections
// =============================================================================

/// Every input the session accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One second elapsed.
    Tick,
    /// A producer observed a violation.
    Violation {
        /// Kind of violation.
        kind: ViolationKind,
        /// Human-readable detail.
        message: String,
    },
    /// Someone asked to submit.
    SubmitRequested {
        /// Why.
        reason: SubmitReason,
    },
}

/// What a single dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// Ledger outcome, for violation events.
    pub record: Option<RecordOutcome>,
    /// Set when this dispatch moved the session from `Active` to `Submitted`.
    pub transition: Option<SubmitReason>,
}

/// Read-only projection of a session, used for the final summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub session_id: String,
    /// Lifecycle state.
    pub state: SessionState,
    /// Submit reason, once submitted.
    pub reason: Option<SubmitReason>,
    /// Counting violations recorded.
    pub warning_count: u32,
    /// Termination threshold.
    pub max_warnings: u32,
    /// Violations of any kind recorded.
    pub violations_recorded: usize,
    /// Seconds left on the countdown.
    pub remaining_secs: u64,
    /// Questions on the sheet.
    pub total_questions: usize,
    /// Questions with an answer.
    pub attempted: usize,
    /// Questions without an answer.
    pub unattempted: usize,
}

/// Live status for the exam screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Lifecycle state.
    pub state: SessionState,
    /// Seconds left on the countdown.
    pub remaining_secs: u64,
    /// Remaining time as `MM:SS`.
    pub formatted_time: String,
    /// Counting violations recorded.
    pub warning_count: u32,
    /// Termination threshold.
    pub max_warnings: u32,
    /// Most recent violations, oldest first.
    pub recent_violations: Vec<Violation>,
}

// =============================================================================
// ExamSession
// =============================================================================

/// The exam session state machine.
#[derive(Debug)]
pub struct ExamSession {
    session_id: String,
    state: SessionState,
    reason: Option<SubmitReason>,
    policy: EscalationPolicy,
    ledger: ViolationLedger,
    countdown: Countdown,
    answers: AnswerSheet,
    recent_limit: usize,
    clock: Arc<dyn Clock>,
    outbox: VecDeque<Notification>,
    terminal: Option<SessionSnapshot>,
}

impl ExamSession {
    /// Creates an active session using the system clock.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an active session with an injected clock.
    #[must_use]
    pub fn with_clock(config: &MonitorConfig, clock: Arc<dyn Clock>) -> Self {
        let session_id = format!("S-{}", Uuid::new_v4());
        debug!(
            session_id = %session_id,
            duration_secs = config.exam_duration_secs,
            max_warnings = config.max_warnings,
            "exam session created"
        );
        Self {
            session_id,
            state: SessionState::Active,
            reason: None,
            policy: EscalationPolicy::new(config.max_warnings),
            ledger: ViolationLedger::new(),
            countdown: Countdown::new(config.exam_duration_secs),
            answers: AnswerSheet::new(config.total_questions),
            recent_limit: config.recent_violations_limit,
            clock,
            outbox: VecDeque::new(),
            terminal: None,
        }
    }

    /// Applies one event. This is the only mutation path for monitor state.
    pub fn dispatch(&mut self, event: SessionEvent) -> DispatchOutcome {
        match event {
            SessionEvent::Tick => self.on_tick(),
            SessionEvent::Violation { kind, message } => self.on_violation(kind, message),
            SessionEvent::SubmitRequested { reason } => DispatchOutcome {
                record: None,
                transition: self.transition(reason),
            },
        }
    }

    fn on_tick(&mut self) -> DispatchOutcome {
        if !self.state.is_active() {
            return DispatchOutcome::default();
        }
        match self.countdown.tick() {
            TickOutcome::Expired => {
                info!(session_id = %self.session_id, "countdown expired");
                DispatchOutcome {
                    record: None,
                    transition: self.transition(SubmitReason::Timeout),
                }
            },
            TickOutcome::Running { .. } | TickOutcome::Stopped => DispatchOutcome::default(),
        }
    }

    fn on_violation(&mut self, kind: ViolationKind, message: String) -> DispatchOutcome {
        let escalation = self.policy.classify(kind);
        if !self.state.is_active() {
            debug!(kind = %kind, "violation after submission rejected");
            return DispatchOutcome {
                record: Some(RecordOutcome::rejected(
                    self.ledger.warning_count(),
                    escalation,
                )),
                transition: None,
            };
        }

        let violation = Violation::new(kind, message, self.clock.now());
        let outcome = self.ledger.append(violation, &self.policy);
        if !outcome.accepted {
            return DispatchOutcome {
                record: Some(outcome),
                transition: None,
            };
        }

        if let Some(recorded) = self.ledger.entries().last() {
            warn!(
                session_id = %self.session_id,
                kind = %kind,
                escalation = %escalation,
                warning_count = outcome.warning_count,
                max_warnings = self.policy.max_warnings(),
                "integrity violation recorded"
            );
            self.outbox.push_back(Notification::for_violation(
                recorded,
                &self.policy,
                outcome.warning_count,
            ));
        }

        let transition = match outcome.decision {
            PolicyDecision::Terminate => {
                self.outbox
                    .push_back(Notification::terminated(self.policy.max_warnings()));
                self.transition(SubmitReason::Termination)
            },
            PolicyDecision::Continue => None,
        };

        DispatchOutcome {
            record: Some(outcome),
            transition,
        }
    }

    /// Performs the one-way transition. Returns `None` if already submitted.
    fn transition(&mut self, reason: SubmitReason) -> Option<SubmitReason> {
        if !self.state.is_active() {
            debug!(
                session_id = %self.session_id,
                requested = %reason,
                "submit request ignored; session already submitted"
            );
            return None;
        }

        self.state = SessionState::Submitted;
        self.reason = Some(reason);
        self.countdown.freeze();
        self.outbox.push_back(Notification::submitted(reason));
        let snapshot = self.capture();
        info!(
            session_id = %self.session_id,
            reason = %reason,
            warning_count = snapshot.warning_count,
            attempted = snapshot.attempted,
            remaining = %format_time(snapshot.remaining_secs),
            "exam session submitted"
        );
        self.terminal = Some(snapshot);
        Some(reason)
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> DispatchOutcome {
        self.dispatch(SessionEvent::Tick)
    }

    /// Offers a violation to the ledger.
    pub fn record_violation(
        &mut self,
        kind: ViolationKind,
        message: impl Into<String>,
    ) -> RecordOutcome {
        let escalation = self.policy.classify(kind);
        let outcome = self.dispatch(SessionEvent::Violation {
            kind,
            message: message.into(),
        });
        outcome.record.unwrap_or_else(|| {
            RecordOutcome::rejected(self.ledger.warning_count(), escalation)
        })
    }

    /// Requests submission. Idempotent: returns the terminal snapshot.
    pub fn request_submit(&mut self, reason: SubmitReason) -> SessionSnapshot {
        self.dispatch(SessionEvent::SubmitRequested { reason });
        self.snapshot()
    }

    /// User-confirmed submission.
    pub fn confirm_and_submit(&mut self) -> SessionSnapshot {
        self.request_submit(SubmitReason::User)
    }

    /// Selects an answer. Rejected once submitted.
    pub fn answer(&mut self, question: usize, option: u32) -> Result<(), SessionError> {
        if !self.state.is_active() {
            return Err(SessionError::AlreadySubmitted);
        }
        self.answers.select(question, option)
    }

    /// Clears an answer. Rejected once submitted.
    pub fn clear_answer(&mut self, question: usize) -> Result<(), SessionError> {
        if !self.state.is_active() {
            return Err(SessionError::AlreadySubmitted);
        }
        self.answers.clear(question)
    }

    /// Removes and returns queued notifications in emission order.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.outbox.drain(..).collect()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Current snapshot; the frozen terminal snapshot once submitted.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.terminal.clone().unwrap_or_else(|| self.capture())
    }

    fn capture(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            state: self.state,
            reason: self.reason,
            warning_count: self.ledger.warning_count(),
            max_warnings: self.policy.max_warnings(),
            violations_recorded: self.ledger.len(),
            remaining_secs: self.countdown.remaining_secs(),
            total_questions: self.answers.total(),
            attempted: self.answers.attempted(),
            unattempted: self.answers.unattempted(),
        }
    }

    /// Live status for the exam screen.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            remaining_secs: self.countdown.remaining_secs(),
            formatted_time: self.countdown.formatted(),
            warning_count: self.ledger.warning_count(),
            max_warnings: self.policy.max_warnings(),
            recent_violations: self.ledger.recent(self.recent_limit).to_vec(),
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Submit reason, once submitted.
    #[must_use]
    pub const fn reason(&self) -> Option<SubmitReason> {
        self.reason
    }

    /// Counting violations recorded.
    #[must_use]
    pub const fn warning_count(&self) -> u32 {
        self.ledger.warning_count()
    }

    /// Termination threshold.
    #[must_use]
    pub const fn max_warnings(&self) -> u32 {
        self.policy.max_warnings()
    }

    /// Seconds left on the countdown.
    #[must_use]
    pub const fn remaining_secs(&self) -> u64 {
        self.countdown.remaining_secs()
    }

    /// The violation ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ViolationLedger {
        &self.ledger
    }

    /// The answer sheet.
    #[must_use]
    pub const fn answers(&self) -> &AnswerSheet {
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::clock::FixedClock;
    use crate::notification::Severity;

    fn session(duration: u64, max_warnings: u32) -> ExamSession {
        let config = MonitorConfig {
            exam_duration_secs: duration,
            max_warnings,
            total_questions: 4,
            ..MonitorConfig::default()
        };
        let clock = FixedClock::new(chrono::Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap());
        ExamSession::with_clock(&config, Arc::new(clock))
    }

    #[test]
    fn test_initial_state() {
        let s = session(2700, 3);
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.reason(), None);
        assert_eq!(s.status().formatted_time, "45:00");
        assert!(s.session_id().starts_with("S-"));
    }

    #[test]
    fn test_violation_timestamp_from_clock() {
        let mut s = session(2700, 3);
        s.record_violation(ViolationKind::FaceMissing, "No face detected");
        let v = &s.ledger().entries()[0];
        assert_eq!(
            v.timestamp(),
            chrono::Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_termination_notifications_in_order() {
        let mut s = session(2700, 1);
        s.record_violation(ViolationKind::MultipleFaces, "2 faces detected");
        let notes = s.drain_notifications();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].severity, Severity::Warning);
        assert_eq!(notes[1].title, "Exam terminated");
        assert_eq!(notes[2].title, "Exam submitted");
        assert!(s.drain_notifications().is_empty());
    }

    #[test]
    fn test_submit_emits_single_confirmation() {
        let mut s = session(2700, 3);
        s.confirm_and_submit();
        s.request_submit(SubmitReason::Timeout);
        s.request_submit(SubmitReason::Termination);
        let notes = s.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, SubmitReason::User.confirmation_message());
        assert_eq!(s.reason(), Some(SubmitReason::User));
    }

    #[test]
    fn test_violation_after_submit_rejected() {
        let mut s = session(2700, 3);
        s.confirm_and_submit();
        let outcome = s.record_violation(ViolationKind::FaceMissing, "late");
        assert!(!outcome.accepted);
        assert!(s.ledger().is_empty());
    }

    #[test]
    fn test_tick_frozen_after_submit() {
        let mut s = session(10, 3);
        s.tick();
        s.confirm_and_submit();
        for _ in 0..20 {
            assert_eq!(s.tick(), DispatchOutcome::default());
        }
        assert_eq!(s.remaining_secs(), 9);
        assert_eq!(s.state(), SessionState::Submitted);
    }

    #[test]
    fn test_answers_gated_by_state() {
        let mut s = session(2700, 3);
        s.answer(0, 1).unwrap();
        s.answer(2, 3).unwrap();
        s.clear_answer(2).unwrap();
        assert_eq!(
            s.answer(9, 0),
            Err(SessionError::QuestionOutOfRange { index: 9, total: 4 })
        );

        let snapshot = s.confirm_and_submit();
        assert_eq!(snapshot.total_questions, 4);
        assert_eq!(snapshot.attempted, 1);
        assert_eq!(snapshot.unattempted, 3);
        assert_eq!(s.answer(1, 0), Err(SessionError::AlreadySubmitted));
        assert_eq!(s.clear_answer(0), Err(SessionError::AlreadySubmitted));
    }

    #[test]
    fn test_status_recent_violations_limited() {
        let mut s = session(2700, 100);
        for _ in 0..8 {
            s.record_violation(ViolationKind::FullscreenExit, "Exited full-screen mode");
        }
        let status = s.status();
        assert_eq!(status.recent_violations.len(), 5);
        assert_eq!(status.warning_count, 0);
        assert_eq!(status.max_warnings, 100);
    }

    #[test]
    fn test_submit_reason_serde() {
        let json = serde_json::to_string(&SubmitReason::Termination).unwrap();
        assert_eq!(json, "\"termination\"");
    }
}
