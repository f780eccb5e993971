//! Error types for session operations.
//!
//! The monitor operations themselves never fail: duplicate submissions are
//! no-ops and late violations are rejected through
//! [`RecordOutcome`](crate::ledger::RecordOutcome). Errors only arise from
//! answer-sheet edits, which are gated by the session state.

use thiserror::Error;

/// Errors returned by answer-sheet operations on a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    /// The session is submitted; answers are frozen.
    #[error("session already submitted")]
    AlreadySubmitted,

    /// The question index does not exist.
    #[error("question {index} out of range (total: {total})")]
    QuestionOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of questions on the sheet.
        total: usize,
    },
}

impl SessionError {
    /// Creates a new out-of-range error.
    #[must_use]
    pub const fn out_of_range(index: usize, total: usize) -> Self {
        Self::QuestionOutOfRange { index, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            SessionError::AlreadySubmitted.to_string(),
            "session already submitted"
        );
        let err = SessionError::out_of_range(7, 5);
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains('5'));
    }
}
