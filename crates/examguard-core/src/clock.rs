//! Wall-clock source for violation timestamps.
//!
//! Violation timestamps come from an injected [`Clock`] rather than direct
//! `Utc::now()` calls, so tests can pin them with [`FixedClock`].

use std::fmt;

use chrono::{DateTime, Utc};

/// Trait for wall-clock implementations.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    /// The instant to return.
    pub instant: DateTime<Utc>,
}

impl FixedClock {
    /// Creates a fixed clock.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}
