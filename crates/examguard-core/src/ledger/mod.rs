//! Append-only violation ledger.
//!
//! The ledger keeps every accepted [`Violation`] in arrival order together
//! with the derived warning count. Only counting violations (per the
//! [`EscalationPolicy`]) advance the count, and once the count reaches the
//! policy threshold the ledger stops accepting entries.

#[cfg(test)]
mod proptest_ledger;

use serde::Serialize;

use crate::policy::{Escalation, EscalationPolicy, PolicyDecision};
use crate::violation::Violation;

/// Result of offering a violation to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Warning count after the call.
    pub warning_count: u32,
    /// Whether the violation was appended.
    pub accepted: bool,
    /// Classification of the offered violation.
    pub escalation: Escalation,
    /// Threshold decision; always `Continue` for rejected violations.
    pub decision: PolicyDecision,
}

impl RecordOutcome {
    /// Outcome for a violation that was not appended.
    #[must_use]
    pub const fn rejected(warning_count: u32, escalation: Escalation) -> Self {
        Self {
            warning_count,
            accepted: false,
            escalation,
            decision: PolicyDecision::Continue,
        }
    }
}

/// Ordered record of violations plus the warning count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViolationLedger {
    entries: Vec<Violation>,
    warning_count: u32,
}

impl ViolationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            warning_count: 0,
        }
    }

    /// Appends `violation` unless the policy threshold was already reached.
    pub fn append(&mut self, violation: Violation, policy: &EscalationPolicy) -> RecordOutcome {
        let kind = violation.kind();
        let escalation = policy.classify(kind);
        if policy.is_exhausted(self.warning_count) {
            return RecordOutcome::rejected(self.warning_count, escalation);
        }

        if escalation.counts() {
            self.warning_count = self.warning_count.saturating_add(1);
        }
        self.entries.push(violation);

        RecordOutcome {
            warning_count: self.warning_count,
            accepted: true,
            escalation,
            decision: policy.decide(kind, self.warning_count),
        }
    }

    /// Number of counting violations accepted so far.
    #[must_use]
    pub const fn warning_count(&self) -> u32 {
        self.warning_count
    }

    /// Number of recorded violations of any kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[Violation] {
        &self.entries
    }

    /// The last `n` entries, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> &[Violation] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}
