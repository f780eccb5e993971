//! # examguard-core
//!
//! Deterministic core of the exam integrity monitor.
//!
//! This crate holds everything about a monitored exam session that does not
//! need an async runtime: the session state machine, the violation ledger and
//! its escalation policy, the countdown, the answer sheet and the
//! configuration. The daemon crate drives it from a single owning task.
//!
//! ## Core Concepts
//!
//! - **Violation**: an immutable integrity-breach record ([`Violation`])
//! - **Counting / advisory**: whether a [`ViolationKind`] advances the warning
//!   count ([`EscalationPolicy::classify`])
//! - **Session**: one exam attempt, `Active` until it is `Submitted`
//!   ([`ExamSession`])
//!
//! ## Example
//!
//! ```rust
//! use examguard_core::{ExamSession, MonitorConfig, SessionState, SubmitReason, ViolationKind};
//!
//! let config = MonitorConfig {
//!     max_warnings: 2,
//!     ..MonitorConfig::default()
//! };
//! let mut session = ExamSession::new(&config);
//!
//! session.record_violation(ViolationKind::FullscreenExit, "Exited full-screen mode");
//! assert_eq!(session.warning_count(), 0);
//!
//! session.record_violation(ViolationKind::FaceMissing, "No face detected");
//! session.record_violation(ViolationKind::MultipleFaces, "2 faces detected");
//!
//! let snapshot = session.snapshot();
//! assert_eq!(snapshot.state, SessionState::Submitted);
//! assert_eq!(snapshot.reason, Some(SubmitReason::Termination));
//! ```

#![warn(missing_docs)]

pub mod answers;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod error;
pub mod ledger;
pub mod notification;
pub mod policy;
pub mod session;
pub mod violation;

// Re-export main types at crate root for convenience
pub use answers::AnswerSheet;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, MonitorConfig};
pub use countdown::{Countdown, TickOutcome, format_time};
pub use error::SessionError;
pub use ledger::{RecordOutcome, ViolationLedger};
pub use notification::{Notification, Severity};
pub use policy::{Escalation, EscalationPolicy, PolicyDecision};
pub use session::{
    DispatchOutcome, ExamSession, SessionEvent, SessionSnapshot, SessionState, SessionStatus,
    SubmitReason,
};
pub use violation::{Violation, ViolationKind};
