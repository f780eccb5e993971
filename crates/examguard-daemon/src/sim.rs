//! Simulated capabilities.
//!
//! Used by the `examguard` binary for scripted dry runs and by the
//! integration tests. Each simulation is deterministic under a paused tokio
//! clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use examguard_core::SessionSnapshot;
use tokio::sync::watch;

use crate::capability::{
    CapabilityError, FaceBox, Frame, FrameSource, FullscreenHost, PresenceDetector,
    SubmissionSink,
};

// =============================================================================
// Frame source
// =============================================================================

/// Frame source producing blank frames once marked ready.
#[derive(Debug)]
pub struct StaticFrameSource {
    ready: AtomicBool,
    sequence: AtomicU64,
}

impl StaticFrameSource {
    /// Creates a source; `ready` controls whether frames are yielded.
    #[must_use]
    pub const fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
            sequence: AtomicU64::new(0),
        }
    }

    /// Starts or stops yielding frames.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn current_frame(&self) -> Option<Frame> {
        if !self.ready.load(Ordering::SeqCst) {
            return None;
        }
        Some(Frame {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            width: 4,
            height: 4,
            pixels: vec![0; 16],
        })
    }
}

// =============================================================================
// Presence detector
// =============================================================================

/// Detector that replays a script of face counts.
///
/// When the script runs out, every detection returns `fallback` faces.
#[derive(Debug)]
pub struct ScriptedDetector {
    script: Mutex<VecDeque<usize>>,
    fallback: usize,
    latency: Duration,
    ready: AtomicBool,
    calls: AtomicU32,
}

impl ScriptedDetector {
    /// Creates a ready detector replaying `script`, then `fallback`.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = usize>, fallback: usize) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            latency: Duration::ZERO,
            ready: AtomicBool::new(true),
            calls: AtomicU32::new(0),
        }
    }

    /// Adds simulated inference latency to every detection.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Marks the detector as (not) loaded.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Number of detections started.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresenceDetector for ScriptedDetector {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn detect(&self, _frame: &Frame) -> Result<Vec<FaceBox>, CapabilityError> {
        if !self.is_ready() {
            return Err(CapabilityError::Unavailable(
                "detector model not loaded".to_string(),
            ));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let count = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let face = FaceBox {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            score: 0.9,
        };
        Ok(vec![face; count])
    }
}

// =============================================================================
// Fullscreen host
// =============================================================================

/// In-memory fullscreen host.
#[derive(Debug)]
pub struct SimulatedFullscreen {
    state: watch::Sender<bool>,
    refuse: AtomicBool,
    requests: AtomicU32,
}

impl SimulatedFullscreen {
    /// Creates a host starting in the given fullscreen state.
    #[must_use]
    pub fn new(fullscreen: bool) -> Self {
        let (state, _) = watch::channel(fullscreen);
        Self {
            state,
            refuse: AtomicBool::new(false),
            requests: AtomicU32::new(0),
        }
    }

    /// Makes subsequent fullscreen requests fail (or succeed again).
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Simulates the candidate leaving fullscreen.
    pub fn exit(&self) {
        self.set(false);
    }

    /// Simulates the host entering fullscreen.
    pub fn enter(&self) {
        self.set(true);
    }

    fn set(&self, fullscreen: bool) {
        self.state.send_if_modified(|current| {
            let modified = *current != fullscreen;
            *current = fullscreen;
            modified
        });
    }

    /// Number of fullscreen requests received.
    #[must_use]
    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FullscreenHost for SimulatedFullscreen {
    fn is_fullscreen(&self) -> bool {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    async fn request_fullscreen(&self) -> Result<(), CapabilityError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(CapabilityError::Refused(
                "fullscreen request denied".to_string(),
            ));
        }
        self.enter();
        Ok(())
    }
}

// =============================================================================
// Submission sink
// =============================================================================

/// Sink that keeps every submitted snapshot.
#[derive(Debug, Default)]
pub struct RecordingSink {
    submitted: Mutex<Vec<SessionSnapshot>>,
}

impl RecordingSink {
    /// Snapshots received so far.
    #[must_use]
    pub fn submitted(&self) -> Vec<SessionSnapshot> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SubmissionSink for RecordingSink {
    fn submit(&self, snapshot: &SessionSnapshot) {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_detector_replays_then_falls_back() {
        let detector = ScriptedDetector::new([0, 2], 1);
        let frame = StaticFrameSource::new(true).current_frame().await.unwrap();
        assert_eq!(detector.detect(&frame).await.unwrap().len(), 0);
        assert_eq!(detector.detect(&frame).await.unwrap().len(), 2);
        assert_eq!(detector.detect(&frame).await.unwrap().len(), 1);
        assert_eq!(detector.calls(), 3);
    }

    #[tokio::test]
    async fn test_unready_sources() {
        let frames = StaticFrameSource::new(false);
        assert!(frames.current_frame().await.is_none());
        frames.set_ready(true);
        assert_eq!(frames.current_frame().await.unwrap().sequence, 0);

        let detector = ScriptedDetector::new(Vec::new(), 1);
        detector.set_ready(false);
        let frame = frames.current_frame().await.unwrap();
        assert!(matches!(
            detector.detect(&frame).await,
            Err(CapabilityError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fullscreen_refusal() {
        let host = SimulatedFullscreen::new(false);
        host.set_refuse(true);
        assert!(host.request_fullscreen().await.is_err());
        assert!(!host.is_fullscreen());

        host.set_refuse(false);
        host.request_fullscreen().await.unwrap();
        assert!(host.is_fullscreen());
        assert_eq!(host.requests(), 2);
    }

    #[test]
    fn test_fullscreen_notifies_only_on_change() {
        let host = SimulatedFullscreen::new(true);
        let mut rx = host.subscribe();
        host.enter();
        assert!(!rx.has_changed().unwrap());
        host.exit();
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
    }
}
