//! Session actor and its handle.
//!
//! One tokio task owns the [`ExamSession`]. The countdown, presence and
//! fullscreen producers, as well as the UI, only talk to it through a
//! [`MonitorHandle`], which turns every call into a [`MonitorCommand`] on a
//! single `mpsc` channel. Commands are applied strictly in arrival order, so
//! concurrent submit requests (a threshold violation racing the countdown's
//! last tick, say) resolve as "first serialized wins".
//!
//! # Producer Lifecycle
//!
//! Producers are spawned by [`MonitorBuilder::spawn`] and registered with the
//! actor together with a shared [`CancellationToken`]. On the transition to
//! `Submitted` the actor cancels the token: pending detector polls and
//! fullscreen re-entry delays are dropped mid-flight. On shutdown the actor
//! closes its command channel and joins every producer task.
//!
//! # Example
//!
//! ```rust,ignore
//! let (handle, actor) = MonitorBuilder::new(MonitorConfig::default())
//!     .with_presence(frames, detector)
//!     .with_fullscreen(host)
//!     .spawn()?;
//!
//! let snapshot = handle.wait_submitted().await?;
//! handle.shutdown().await?;
//! actor.await?;
//! ```

use std::sync::Arc;

use examguard_core::{
    Clock, ConfigError, ExamSession, MonitorConfig, Notification, RecordOutcome, SessionError,
    SessionEvent, SessionSnapshot, SessionState, SessionStatus, SubmitReason, SystemClock,
    ViolationKind,
};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capability::{
    FrameSource, FullscreenHost, LoggingSink, PresenceDetector, SubmissionSink,
};
use crate::producer::{FullscreenGuard, PresenceAdapter, run_countdown};

/// Capacity of the actor's command channel.
pub const COMMAND_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Error Types
// =============================================================================

/// Errors returned by [`MonitorHandle`] calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MonitorError {
    /// The session actor has stopped.
    #[error("session actor is no longer running")]
    ActorClosed,

    /// The session rejected an answer edit.
    #[error(transparent)]
    Session(#[from] SessionError),
}

// =============================================================================
// Commands
// =============================================================================

/// Messages processed by the session actor.
#[derive(Debug)]
pub enum MonitorCommand {
    /// One countdown second elapsed.
    Tick,
    /// A producer or caller observed a violation.
    Violation {
        /// Kind of violation.
        kind: ViolationKind,
        /// Human-readable detail.
        message: String,
        /// Optional reply with the ledger outcome.
        reply: Option<oneshot::Sender<RecordOutcome>>,
    },
    /// Submit the session.
    Submit {
        /// Why.
        reason: SubmitReason,
        /// Reply with the terminal snapshot.
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Select (`Some`) or clear (`None`) an answer.
    Answer {
        /// Question index.
        question: usize,
        /// Selected option.
        option: Option<u32>,
        /// Reply with the edit result.
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    /// Live status query.
    Status {
        /// Reply with the status.
        reply: oneshot::Sender<SessionStatus>,
    },
    /// Snapshot query.
    Snapshot {
        /// Reply with the snapshot.
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Stop the actor and join all producers.
    Shutdown,
}

// =============================================================================
// MonitorHandle
// =============================================================================

/// Cloneable handle into the session actor.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<MonitorCommand>,
    state: watch::Receiver<SessionState>,
    notifications: broadcast::Sender<Notification>,
}

impl MonitorHandle {
    async fn send(&self, command: MonitorCommand) -> Result<(), MonitorError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| MonitorError::ActorClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> MonitorCommand,
    ) -> Result<T, MonitorError> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| MonitorError::ActorClosed)
    }

    /// Posts one countdown tick.
    pub async fn tick(&self) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Tick).await
    }

    /// Posts a violation without waiting for the outcome.
    pub async fn report_violation(
        &self,
        kind: ViolationKind,
        message: impl Into<String>,
    ) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Violation {
            kind,
            message: message.into(),
            reply: None,
        })
        .await
    }

    /// Records a violation and returns the ledger outcome.
    pub async fn record_violation(
        &self,
        kind: ViolationKind,
        message: impl Into<String>,
    ) -> Result<RecordOutcome, MonitorError> {
        let message = message.into();
        self.request(|reply| MonitorCommand::Violation {
            kind,
            message,
            reply: Some(reply),
        })
        .await
    }

    /// Requests submission. Idempotent: every call returns the same terminal
    /// snapshot.
    pub async fn request_submit(
        &self,
        reason: SubmitReason,
    ) -> Result<SessionSnapshot, MonitorError> {
        self.request(|reply| MonitorCommand::Submit { reason, reply })
            .await
    }

    /// User-confirmed submission.
    pub async fn confirm_and_submit(&self) -> Result<SessionSnapshot, MonitorError> {
        self.request_submit(SubmitReason::User).await
    }

    /// Selects an answer.
    pub async fn answer(&self, question: usize, option: u32) -> Result<(), MonitorError> {
        self.request(|reply| MonitorCommand::Answer {
            question,
            option: Some(option),
            reply,
        })
        .await?
        .map_err(MonitorError::from)
    }

    /// Clears an answer.
    pub async fn clear_answer(&self, question: usize) -> Result<(), MonitorError> {
        self.request(|reply| MonitorCommand::Answer {
            question,
            option: None,
            reply,
        })
        .await?
        .map_err(MonitorError::from)
    }

    /// Live status for the exam screen.
    pub async fn status(&self) -> Result<SessionStatus, MonitorError> {
        self.request(|reply| MonitorCommand::Status { reply }).await
    }

    /// Current snapshot; the frozen terminal snapshot once submitted.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, MonitorError> {
        self.request(|reply| MonitorCommand::Snapshot { reply })
            .await
    }

    /// Last published session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Returns `true` while the session is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Waits until the session is submitted and returns the terminal snapshot.
    pub async fn wait_submitted(&self) -> Result<SessionSnapshot, MonitorError> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| !s.is_active())
            .await
            .map_err(|_| MonitorError::ActorClosed)?;
        self.snapshot().await
    }

    /// Subscribes to user-facing notifications.
    #[must_use]
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Asks the actor to stop. Producers are joined before the actor exits.
    pub async fn shutdown(&self) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Shutdown).await
    }
}

// =============================================================================
// MonitorBuilder
// =============================================================================

/// Wires capabilities into a running session actor.
pub struct MonitorBuilder {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    presence: Option<(Arc<dyn FrameSource>, Arc<dyn PresenceDetector>)>,
    fullscreen: Option<Arc<dyn FullscreenHost>>,
    sink: Arc<dyn SubmissionSink>,
}

impl MonitorBuilder {
    /// Starts a builder with the system clock, no capabilities and a logging
    /// submission sink.
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            presence: None,
            fullscreen: None,
            sink: Arc::new(LoggingSink),
        }
    }

    /// Uses `clock` for violation timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Enables presence monitoring.
    #[must_use]
    pub fn with_presence(
        mut self,
        frames: Arc<dyn FrameSource>,
        detector: Arc<dyn PresenceDetector>,
    ) -> Self {
        self.presence = Some((frames, detector));
        self
    }

    /// Enables the fullscreen guard.
    #[must_use]
    pub fn with_fullscreen(mut self, host: Arc<dyn FullscreenHost>) -> Self {
        self.fullscreen = Some(host);
        self
    }

    /// Replaces the submission sink.
    #[must_use]
    pub fn with_submission_sink(mut self, sink: Arc<dyn SubmissionSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validates the configuration and spawns the actor and its producers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> Result<(MonitorHandle, JoinHandle<()>), ConfigError> {
        self.config.validate()?;

        let session = ExamSession::with_clock(&self.config, self.clock);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(session.state());
        let (notification_tx, _) = broadcast::channel(self.config.notification_capacity);
        let cancel = CancellationToken::new();

        let handle = MonitorHandle {
            commands: command_tx,
            state: state_rx,
            notifications: notification_tx.clone(),
        };

        let mut producers = Vec::with_capacity(3);
        producers.push((
            "countdown",
            tokio::spawn(run_countdown(handle.clone(), cancel.child_token())),
        ));
        if let Some((frames, detector)) = self.presence {
            let adapter = PresenceAdapter::new(
                frames,
                detector,
                self.config.detection_poll_interval(),
                self.config.min_consecutive_misses,
            );
            producers.push((
                "presence",
                tokio::spawn(adapter.run(handle.clone(), cancel.child_token())),
            ));
        }
        if let Some(host) = self.fullscreen {
            let guard = FullscreenGuard::new(host, self.config.fullscreen_reentry_delay());
            producers.push((
                "fullscreen",
                tokio::spawn(guard.run(handle.clone(), cancel.child_token())),
            ));
        }

        info!(
            session_id = %session.session_id(),
            duration_secs = self.config.exam_duration_secs,
            max_warnings = self.config.max_warnings,
            producers = producers.len(),
            "exam monitor started"
        );

        let actor = SessionActor {
            session,
            commands: command_rx,
            state: state_tx,
            notifications: notification_tx,
            cancel,
            producers,
            sink: self.sink,
        };
        Ok((handle, tokio::spawn(actor.run())))
    }
}

// =============================================================================
// SessionActor
// =============================================================================

struct SessionActor {
    session: ExamSession,
    commands: mpsc::Receiver<MonitorCommand>,
    state: watch::Sender<SessionState>,
    notifications: broadcast::Sender<Notification>,
    cancel: CancellationToken,
    producers: Vec<(&'static str, JoinHandle<()>)>,
    sink: Arc<dyn SubmissionSink>,
}

impl SessionActor {
    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            if matches!(command, MonitorCommand::Shutdown) {
                debug!("session actor shutdown requested");
                break;
            }

            let was_active = self.session.state().is_active();
            self.handle(command);
            self.flush_notifications();
            if was_active && !self.session.state().is_active() {
                self.on_submitted();
            }
        }
        self.teardown().await;
    }

    fn handle(&mut self, command: MonitorCommand) {
        match command {
            MonitorCommand::Tick => {
                self.session.dispatch(SessionEvent::Tick);
            },
            MonitorCommand::Violation {
                kind,
                message,
                reply,
            } => {
                let outcome = self.session.record_violation(kind, message);
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            },
            MonitorCommand::Submit { reason, reply } => {
                let _ = reply.send(self.session.request_submit(reason));
            },
            MonitorCommand::Answer {
                question,
                option,
                reply,
            } => {
                let result = match option {
                    Some(option) => self.session.answer(question, option),
                    None => self.session.clear_answer(question),
                };
                let _ = reply.send(result);
            },
            MonitorCommand::Status { reply } => {
                let _ = reply.send(self.session.status());
            },
            MonitorCommand::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            },
            MonitorCommand::Shutdown => {},
        }
    }

    fn flush_notifications(&mut self) {
        for notification in self.session.drain_notifications() {
            // No subscribers is not an error.
            let _ = self.notifications.send(notification);
        }
    }

    fn on_submitted(&mut self) {
        self.cancel.cancel();
        self.state.send_replace(self.session.state());
        let snapshot = self.session.snapshot();
        self.sink.submit(&snapshot);
        info!(
            session_id = %snapshot.session_id,
            reason = ?snapshot.reason,
            "producers cancelled after submission"
        );
    }

    async fn teardown(mut self) {
        self.cancel.cancel();
        self.commands.close();
        for (name, task) in self.producers.drain(..) {
            if let Err(e) = task.await {
                warn!(producer = name, error = %e, "producer task failed");
            }
        }
        info!(
            session_id = %self.session.session_id(),
            state = %self.session.state(),
            "session actor stopped"
        );
    }
}
