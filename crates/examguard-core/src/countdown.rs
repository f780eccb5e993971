//! Exam countdown.
//!
//! The countdown only moves when ticked by its owner; the runtime drives it
//! once per real-time second. It reports expiry exactly once and then stays
//! stopped. Freezing it (on submission by any other path) also stops it for
//! good.

use serde::{Deserialize, Serialize};

/// Result of a single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time remains.
    Running {
        /// Seconds left after this tick.
        remaining_secs: u64,
    },
    /// This tick reached zero. Reported once.
    Expired,
    /// The countdown is stopped; nothing changed.
    Stopped,
}

/// Monotonically decreasing exam timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    remaining_secs: u64,
    stopped: bool,
}

impl Countdown {
    /// Creates a running countdown starting at `duration_secs`.
    #[must_use]
    pub const fn new(duration_secs: u64) -> Self {
        Self {
            remaining_secs: duration_secs,
            stopped: false,
        }
    }

    /// Advances the countdown by one second.
    pub const fn tick(&mut self) -> TickOutcome {
        if self.stopped {
            return TickOutcome::Stopped;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.stopped = true;
            return TickOutcome::Expired;
        }
        TickOutcome::Running {
            remaining_secs: self.remaining_secs,
        }
    }

    /// Stops the countdown without expiring it.
    pub const fn freeze(&mut self) {
        self.stopped = true;
    }

    /// Seconds left.
    #[must_use]
    pub const fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Returns `true` once expired or frozen.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Remaining time as `MM:SS`.
    #[must_use]
    pub fn formatted(&self) -> String {
        format_time(self.remaining_secs)
    }
}

/// Formats seconds as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours: `6000` renders as `"100:00"`.
#[must_use]
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(2700), "45:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(6000), "100:00");
    }

    #[test]
    fn test_ticks_down_then_expires_once() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.tick(), TickOutcome::Running { remaining_secs: 2 });
        assert_eq!(countdown.tick(), TickOutcome::Running { remaining_secs: 1 });
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert!(countdown.is_stopped());
        assert_eq!(countdown.tick(), TickOutcome::Stopped);
        assert_eq!(countdown.remaining_secs(), 0);
    }

    #[test]
    fn test_freeze_stops_decrements() {
        let mut countdown = Countdown::new(100);
        countdown.tick();
        countdown.freeze();
        for _ in 0..10 {
            assert_eq!(countdown.tick(), TickOutcome::Stopped);
        }
        assert_eq!(countdown.remaining_secs(), 99);
        assert_eq!(countdown.formatted(), "01:39");
    }

    #[test]
    fn test_zero_duration_expires_on_first_tick() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert_eq!(countdown.tick(), TickOutcome::Stopped);
    }
}
