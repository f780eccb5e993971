//! Fullscreen guard producer.
//!
//! Watches the host's fullscreen state. Each exit while the session is active
//! records an advisory `Full-Screen Exit Attempt` and, after a short delay,
//! asks the host to re-enter fullscreen once. A refused re-entry is logged and
//! swallowed; the next exit event tries again.
//!
//! The host's change feed is a `watch` channel, which carries state rather
//! than events. Changes made while the guard is busy coalesce into the latest
//! state: an exit followed by an enter before the guard observes it records
//! nothing, and several exits within one re-entry delay record a single
//! violation. Fullscreen exits are advisory, so this only affects the
//! informational ledger entries, never the warning count.

use std::sync::Arc;
use std::time::Duration;

use examguard_core::ViolationKind;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capability::FullscreenHost;
use crate::monitor::MonitorHandle;

/// Message recorded with each fullscreen exit.
pub const FULLSCREEN_EXIT_MESSAGE: &str = "Exited full-screen mode";

/// Reports fullscreen exits and restores fullscreen.
pub struct FullscreenGuard {
    host: Arc<dyn FullscreenHost>,
    reentry_delay: Duration,
}

impl FullscreenGuard {
    /// Creates a guard over `host`.
    #[must_use]
    pub fn new(host: Arc<dyn FullscreenHost>, reentry_delay: Duration) -> Self {
        Self {
            host,
            reentry_delay,
        }
    }

    async fn request_reentry(&self) {
        match self.host.request_fullscreen().await {
            Ok(()) => debug!("fullscreen restored"),
            Err(e) => warn!(error = %e, "fullscreen re-entry refused"),
        }
    }

    /// Watches fullscreen changes until cancelled.
    ///
    /// On start, a host that is not in fullscreen is asked to enter it once;
    /// that initial state is not a violation.
    pub async fn run(self, handle: MonitorHandle, cancel: CancellationToken) {
        let mut changes = self.host.subscribe();
        changes.mark_unchanged();

        if !self.host.is_fullscreen() {
            info!("requesting initial fullscreen entry");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = self.request_reentry() => {},
            }
        }

        loop {
            let changed = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = changes.changed() => changed,
            };
            if changed.is_err() {
                debug!("fullscreen host closed its change feed");
                break;
            }

            let fullscreen = *changes.borrow_and_update();
            if fullscreen || !handle.is_active() {
                continue;
            }

            let sent = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                sent = handle.report_violation(ViolationKind::FullscreenExit, FULLSCREEN_EXIT_MESSAGE) => sent,
            };
            if sent.is_err() {
                debug!("session actor gone; fullscreen guard stopping");
                break;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.reentry_delay) => {},
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.request_reentry() => {},
            }
        }
        debug!("fullscreen producer stopped");
    }
}
