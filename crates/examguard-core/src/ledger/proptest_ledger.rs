//! Property-based tests for the ledger's warning bound.
//!
//! These tests verify the ledger invariants over arbitrary violation
//! sequences using proptest.

use chrono::Utc;
use proptest::prelude::*;

use super::ViolationLedger;
use crate::policy::{EscalationPolicy, PolicyDecision};
use crate::violation::{Violation, ViolationKind};

/// Strategy for generating a violation kind.
fn kind_strategy() -> impl Strategy<Value = ViolationKind> {
    prop_oneof![
        Just(ViolationKind::FaceMissing),
        Just(ViolationKind::MultipleFaces),
        Just(ViolationKind::FullscreenExit),
    ]
}

proptest! {
    /// Property: warning_count never exceeds max_warnings, and the ledger is
    /// never shorter than the warning count.
    #[test]
    fn prop_warning_count_bounded(
        max_warnings in 1u32..10,
        kinds in prop::collection::vec(kind_strategy(), 0..64),
    ) {
        let policy = EscalationPolicy::new(max_warnings);
        let mut ledger = ViolationLedger::new();
        for kind in kinds {
            let outcome = ledger.append(Violation::new(kind, "p", Utc::now()), &policy);
            prop_assert!(outcome.warning_count <= max_warnings);
            prop_assert!(ledger.len() >= ledger.warning_count() as usize);
        }
    }

    /// Property: exactly one accepted violation carries the Terminate decision,
    /// and it is the last accepted entry.
    #[test]
    fn prop_terminate_is_last_accepted(
        max_warnings in 1u32..6,
        kinds in prop::collection::vec(kind_strategy(), 0..64),
    ) {
        let policy = EscalationPolicy::new(max_warnings);
        let mut ledger = ViolationLedger::new();
        let mut terminated = false;
        for kind in kinds {
            let outcome = ledger.append(Violation::new(kind, "p", Utc::now()), &policy);
            if terminated {
                prop_assert!(!outcome.accepted);
            }
            if outcome.decision == PolicyDecision::Terminate {
                prop_assert!(!terminated);
                prop_assert!(outcome.accepted);
                prop_assert_eq!(outcome.warning_count, max_warnings);
                terminated = true;
            }
        }
    }

    /// Property: advisory violations never move the warning count.
    #[test]
    fn prop_advisory_exclusion(count in 0usize..200) {
        let policy = EscalationPolicy::new(3);
        let mut ledger = ViolationLedger::new();
        for _ in 0..count {
            ledger.append(
                Violation::new(ViolationKind::FullscreenExit, "p", Utc::now()),
                &policy,
            );
        }
        prop_assert_eq!(ledger.warning_count(), 0);
        prop_assert_eq!(ledger.len(), count);
    }
}
