//! Escalation policy.
//!
//! Classifies each [`ViolationKind`] as counting or advisory and decides when
//! the accumulated warning count terminates the session. Fullscreen exits are
//! advisory because the guard re-enters fullscreen on its own; camera breaches
//! count toward termination.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::notification::Severity;
use crate::violation::ViolationKind;

/// Whether a violation contributes to the warning count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Escalation {
    /// Increments the warning count.
    Counting,
    /// Logged only.
    Advisory,
}

impl Escalation {
    /// Returns `true` for [`Escalation::Counting`].
    #[must_use]
    pub const fn counts(self) -> bool {
        matches!(self, Self::Counting)
    }
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counting => write!(f, "counting"),
            Self::Advisory => write!(f, "advisory"),
        }
    }
}

/// Outcome of evaluating one accepted violation against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The session continues.
    Continue,
    /// The warning count reached the maximum; the session must terminate.
    Terminate,
}

/// Per-kind classification plus the termination threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    max_warnings: u32,
}

impl EscalationPolicy {
    /// Creates a policy terminating at `max_warnings` counting violations.
    ///
    /// A threshold of zero is raised to one.
    #[must_use]
    pub const fn new(max_warnings: u32) -> Self {
        let max_warnings = if max_warnings == 0 { 1 } else { max_warnings };
        Self { max_warnings }
    }

    /// Returns the termination threshold.
    #[must_use]
    pub const fn max_warnings(&self) -> u32 {
        self.max_warnings
    }

    /// Classifies a violation kind.
    #[must_use]
    pub const fn classify(&self, kind: ViolationKind) -> Escalation {
        match kind {
            ViolationKind::FullscreenExit => Escalation::Advisory,
            ViolationKind::FaceMissing | ViolationKind::MultipleFaces => Escalation::Counting,
        }
    }

    /// Returns `true` once no further violations may be accepted.
    #[must_use]
    pub const fn is_exhausted(&self, warning_count: u32) -> bool {
        warning_count >= self.max_warnings
    }

    /// Decides what happens after a violation of `kind` was accepted and the
    /// warning count became `warning_count`.
    #[must_use]
    pub const fn decide(&self, kind: ViolationKind, warning_count: u32) -> PolicyDecision {
        if self.classify(kind).counts() && self.is_exhausted(warning_count) {
            PolicyDecision::Terminate
        } else {
            PolicyDecision::Continue
        }
    }

    /// Notification severity for an accepted violation of `kind`.
    #[must_use]
    pub const fn severity(&self, kind: ViolationKind) -> Severity {
        match self.classify(kind) {
            Escalation::Counting => Severity::Warning,
            Escalation::Advisory => Severity::Info,
        }
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_WARNINGS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fullscreen_exit_is_advisory() {
        let policy = EscalationPolicy::new(3);
        for kind in ViolationKind::all() {
            let expected = if kind == ViolationKind::FullscreenExit {
                Escalation::Advisory
            } else {
                Escalation::Counting
            };
            assert_eq!(policy.classify(kind), expected, "{kind}");
        }
    }

    #[test]
    fn test_decide_terminates_at_threshold() {
        let policy = EscalationPolicy::new(3);
        assert_eq!(
            policy.decide(ViolationKind::FaceMissing, 2),
            PolicyDecision::Continue
        );
        assert_eq!(
            policy.decide(ViolationKind::FaceMissing, 3),
            PolicyDecision::Terminate
        );
    }

    #[test]
    fn test_advisory_never_terminates() {
        let policy = EscalationPolicy::new(1);
        assert_eq!(
            policy.decide(ViolationKind::FullscreenExit, 5),
            PolicyDecision::Continue
        );
    }

    #[test]
    fn test_zero_threshold_raised_to_one() {
        assert_eq!(EscalationPolicy::new(0).max_warnings(), 1);
    }

    #[test]
    fn test_severity() {
        let policy = EscalationPolicy::default();
        assert_eq!(policy.severity(ViolationKind::MultipleFaces), Severity::Warning);
        assert_eq!(policy.severity(ViolationKind::FullscreenExit), Severity::Info);
    }
}
