//! Presence detector producer.
//!
//! Polls the external detector at a fixed period and translates face counts
//! into violations:
//!
//! | Faces | Violation                     |
//! |-------|-------------------------------|
//! | 0     | `Face Missing` (counting)     |
//! | 1     | none                          |
//! | > 1   | `Multiple Faces` (counting)   |
//!
//! There is no debouncing by default: every violating poll records a
//! violation. `min_consecutive_misses` above one requires that many violating
//! polls in a row before recording.

use std::sync::Arc;
use std::time::Duration;

use examguard_core::ViolationKind;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::capability::{FrameSource, PresenceDetector};
use crate::monitor::MonitorHandle;

/// Polls a [`PresenceDetector`] and reports presence violations.
pub struct PresenceAdapter {
    frames: Arc<dyn FrameSource>,
    detector: Arc<dyn PresenceDetector>,
    poll_interval: Duration,
    min_consecutive_misses: u32,
}

impl PresenceAdapter {
    /// Creates an adapter. A `min_consecutive_misses` of zero is treated as
    /// one.
    #[must_use]
    pub fn new(
        frames: Arc<dyn FrameSource>,
        detector: Arc<dyn PresenceDetector>,
        poll_interval: Duration,
        min_consecutive_misses: u32,
    ) -> Self {
        Self {
            frames,
            detector,
            poll_interval,
            min_consecutive_misses: min_consecutive_misses.max(1),
        }
    }

    /// Runs one detection. `None` means the tick is skipped.
    async fn poll_once(&self) -> Option<usize> {
        if !self.detector.is_ready() {
            debug!("presence detector not ready; skipping poll");
            return None;
        }
        let Some(frame) = self.frames.current_frame().await else {
            debug!("no frame available; skipping poll");
            return None;
        };
        match self.detector.detect(&frame).await {
            Ok(faces) => Some(faces.len()),
            Err(e) => {
                warn!(error = %e, frame = frame.sequence, "presence detection failed; skipping poll");
                None
            },
        }
    }

    /// Polls until cancelled or the session leaves `Active`.
    ///
    /// A poll still awaiting the detector when the token is cancelled is
    /// dropped without reporting anything.
    pub async fn run(self, handle: MonitorHandle, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut streak: u32 = 0;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {},
            }
            if !handle.is_active() {
                break;
            }

            let count = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                count = self.poll_once() => count,
            };
            let Some(count) = count else {
                continue;
            };

            let Some((kind, message)) = ViolationKind::for_face_count(count) else {
                streak = 0;
                continue;
            };
            streak = streak.saturating_add(1);
            if streak < self.min_consecutive_misses {
                debug!(faces = count, streak, "presence miss below threshold");
                continue;
            }

            let sent = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                sent = handle.report_violation(kind, message) => sent,
            };
            if sent.is_err() {
                debug!("session actor gone; presence polling stopping");
                break;
            }
        }
        debug!("presence producer stopped");
    }
}
