//! User-facing notifications emitted by the session.
//!
//! Notifications are fire-and-forget: the session queues them and the
//! surrounding runtime forwards them to whatever UI is listening. They are not
//! part of the session invariants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::policy::{Escalation, EscalationPolicy};
use crate::session::SubmitReason;
use crate::violation::Violation;

/// Display severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational (advisory violations, plain submission).
    Info,
    /// A counting violation was recorded.
    Warning,
    /// The session was terminated or ended by timeout.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A single notification for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Display severity.
    pub severity: Severity,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Notification {
    /// Notification for an accepted violation.
    ///
    /// Severity and title follow the policy's classification of the kind;
    /// counting titles carry the `warning_count/max` progress.
    #[must_use]
    pub fn for_violation(
        violation: &Violation,
        policy: &EscalationPolicy,
        warning_count: u32,
    ) -> Self {
        let kind = violation.kind();
        let title = match policy.classify(kind) {
            Escalation::Counting => {
                format!("Warning {warning_count}/{}: {kind}", policy.max_warnings())
            },
            Escalation::Advisory => kind.to_string(),
        };
        Self {
            severity: policy.severity(kind),
            title,
            message: violation.message().to_string(),
        }
    }

    /// Notice shown before a session is finalized for repeated violations.
    #[must_use]
    pub fn terminated(max_warnings: u32) -> Self {
        Self {
            severity: Severity::Critical,
            title: "Exam terminated".to_string(),
            message: format!(
                "Maximum warnings ({max_warnings}) reached. Your exam is being submitted."
            ),
        }
    }

    /// Confirmation emitted exactly once when the session is submitted.
    #[must_use]
    pub fn submitted(reason: SubmitReason) -> Self {
        let severity = match reason {
            SubmitReason::User => Severity::Info,
            SubmitReason::Timeout | SubmitReason::Termination => Severity::Critical,
        };
        Self {
            severity,
            title: "Exam submitted".to_string(),
            message: reason.confirmation_message().to_string(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.title, self.message)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::violation::ViolationKind;

    #[test]
    fn test_counting_title_carries_progress() {
        let v = Violation::new(ViolationKind::FaceMissing, "No face detected", Utc::now());
        let n = Notification::for_violation(&v, &EscalationPolicy::new(3), 2);
        assert_eq!(n.severity, Severity::Warning);
        assert_eq!(n.title, "Warning 2/3: Face Missing");
        assert_eq!(n.message, "No face detected");
    }

    #[test]
    fn test_advisory_is_info() {
        let v = Violation::new(
            ViolationKind::FullscreenExit,
            "Exited full-screen mode",
            Utc::now(),
        );
        let n = Notification::for_violation(&v, &EscalationPolicy::new(3), 0);
        assert_eq!(n.severity, Severity::Info);
        assert_eq!(n.title, "Full-Screen Exit Attempt");
    }

    #[test]
    fn test_violation_severity_comes_from_policy() {
        let policy = EscalationPolicy::default();
        for kind in ViolationKind::all() {
            let v = Violation::new(kind, "detail", Utc::now());
            let n = Notification::for_violation(&v, &policy, 1);
            assert_eq!(n.severity, policy.severity(kind), "{kind}");
        }
    }

    #[test]
    fn test_submission_wording_depends_on_reason() {
        let user = Notification::submitted(SubmitReason::User);
        let timeout = Notification::submitted(SubmitReason::Timeout);
        let terminated = Notification::submitted(SubmitReason::Termination);
        assert_eq!(user.severity, Severity::Info);
        assert!(timeout.message.starts_with("Time's up"));
        assert!(terminated.message.contains("terminated"));
        assert_ne!(user.message, timeout.message);
        assert_ne!(timeout.message, terminated.message);
    }
}
