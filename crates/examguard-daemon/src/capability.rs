//! External capabilities consumed by the monitor.
//!
//! The monitor never owns the camera or the display. It talks to them through
//! these traits, which the host environment implements (a browser bridge, a
//! native camera pipeline, or the simulations in [`crate::sim`]).
//!
//! # Failure Semantics
//!
//! Every capability failure is recoverable. The presence producer skips a
//! poll tick on [`CapabilityError`]; the fullscreen producer logs a refused
//! re-entry and waits for the next exit event.

use std::fmt;

use async_trait::async_trait;
use examguard_core::SessionSnapshot;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

// =============================================================================
// Error Types
// =============================================================================

/// Errors reported by external capabilities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CapabilityError {
    /// The capability is not initialized yet (model loading, camera warming).
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    /// The host environment refused the request.
    #[error("request refused by host environment: {0}")]
    Refused(String),

    /// The capability failed while serving the request.
    #[error("capability failed: {0}")]
    Failed(String),
}

// =============================================================================
// Frames
// =============================================================================

/// A single captured video frame.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Monotonic frame sequence number.
    pub sequence: u64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw pixel data; the layout is agreed between source and detector.
    pub pixels: Vec<u8>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &format_args!("[{} bytes]", self.pixels.len()))
            .finish()
    }
}

/// A detected face bounding box, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
    /// Detector confidence in `[0, 1]`.
    pub score: f32,
}

// =============================================================================
// Capability Traits
// =============================================================================

/// Yields the current camera frame.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Returns the latest frame, or `None` if the stream is not ready.
    async fn current_frame(&self) -> Option<Frame>;
}

/// Detects faces in a frame. Only the count matters to the monitor.
#[async_trait]
pub trait PresenceDetector: Send + Sync {
    /// Returns `true` once the detector can serve requests.
    fn is_ready(&self) -> bool;

    /// Runs detection on `frame`. Latency is unspecified.
    async fn detect(&self, frame: &Frame) -> Result<Vec<FaceBox>, CapabilityError>;
}

/// The host's fullscreen state.
#[async_trait]
pub trait FullscreenHost: Send + Sync {
    /// Current fullscreen status.
    fn is_fullscreen(&self) -> bool;

    /// Subscribes to fullscreen changes. The receiver observes the new status
    /// each time the host enters or leaves fullscreen.
    fn subscribe(&self) -> watch::Receiver<bool>;

    /// Asks the host to enter fullscreen.
    async fn request_fullscreen(&self) -> Result<(), CapabilityError>;
}

/// Receives the terminal snapshot once a session is submitted.
///
/// Persistence and network delivery of results live behind this seam.
pub trait SubmissionSink: Send + Sync {
    /// Called exactly once per session, on the transition to `Submitted`.
    fn submit(&self, snapshot: &SessionSnapshot);
}

/// Sink that only logs the submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl SubmissionSink for LoggingSink {
    fn submit(&self, snapshot: &SessionSnapshot) {
        info!(
            session_id = %snapshot.session_id,
            reason = ?snapshot.reason,
            warning_count = snapshot.warning_count,
            attempted = snapshot.attempted,
            unattempted = snapshot.unattempted,
            "submission handed off"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_debug_redacts_pixels() {
        let frame = Frame {
            sequence: 7,
            width: 2,
            height: 2,
            pixels: vec![0; 16],
        };
        let debug = format!("{frame:?}");
        assert!(debug.contains("[16 bytes]"));
        assert!(debug.contains("sequence: 7"));
    }

    #[test]
    fn test_error_display() {
        let err = CapabilityError::Refused("no user gesture".to_string());
        assert!(err.to_string().contains("no user gesture"));
    }
}
