//! examguard-daemon - exam integrity monitor runtime
//!
//! This library runs an [`examguard_core::ExamSession`] inside a single tokio
//! task and connects it to the external capabilities that watch the
//! candidate: a camera frame source with a face-presence detector, and the
//! host's fullscreen state.
//!
//! # Runtime Requirements
//!
//! [`monitor::MonitorBuilder::spawn`] must be called from within a tokio
//! runtime. The `examguard` binary uses the multi-threaded runtime; the
//! actor design does not depend on it.
//!
//! # Modules
//!
//! - [`capability`]: traits for the frame source, presence detector,
//!   fullscreen host and submission sink
//! - [`monitor`]: the session actor, its command set and the
//!   [`monitor::MonitorHandle`]
//! - [`producer`]: countdown, presence and fullscreen producer tasks
//! - [`sim`]: simulated capabilities for dry runs and tests

#![warn(missing_docs)]

pub mod capability;
pub mod monitor;
pub mod producer;
pub mod sim;

pub use capability::{
    CapabilityError, FaceBox, Frame, FrameSource, FullscreenHost, LoggingSink, PresenceDetector,
    SubmissionSink,
};
pub use monitor::{MonitorBuilder, MonitorCommand, MonitorError, MonitorHandle};
