//! Answer tracking used for the submission summary.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Selected option per question; `None` means unattempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet {
    answers: Vec<Option<u32>>,
}

impl AnswerSheet {
    /// Creates a sheet with `total` unattempted questions.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            answers: vec![None; total],
        }
    }

    /// Selects `option` for `question`, replacing any previous choice.
    pub fn select(&mut self, question: usize, option: u32) -> Result<(), SessionError> {
        let total = self.answers.len();
        let slot = self
            .answers
            .get_mut(question)
            .ok_or_else(|| SessionError::out_of_range(question, total))?;
        *slot = Some(option);
        Ok(())
    }

    /// Clears the answer for `question`.
    pub fn clear(&mut self, question: usize) -> Result<(), SessionError> {
        let total = self.answers.len();
        let slot = self
            .answers
            .get_mut(question)
            .ok_or_else(|| SessionError::out_of_range(question, total))?;
        *slot = None;
        Ok(())
    }

    /// Returns the selected option for `question`.
    #[must_use]
    pub fn get(&self, question: usize) -> Option<u32> {
        self.answers.get(question).copied().flatten()
    }

    /// Number of questions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.answers.len()
    }

    /// Number of questions with a selected option.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// Number of questions without a selected option.
    #[must_use]
    pub fn unattempted(&self) -> usize {
        self.total() - self.attempted()
    }
}
