//! Countdown producer.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::monitor::MonitorHandle;

/// Real-time period between countdown ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Posts a tick to the session actor every [`TICK_PERIOD`] until cancelled.
///
/// The first tick fires one period after start. The actor cancels the token
/// when the countdown expires or the session is submitted by another path.
pub async fn run_countdown(handle: MonitorHandle, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {},
        }

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            sent = handle.tick() => sent,
        };
        if sent.is_err() {
            debug!("session actor gone; countdown stopping");
            break;
        }
    }
    debug!("countdown producer stopped");
}
