//! Producer tasks feeding the session actor.
//!
//! Each producer runs as its own task, owns no session state, and only talks
//! to the actor through a [`MonitorHandle`](crate::monitor::MonitorHandle).
//! Every await point is raced against the producer's cancellation token so a
//! submission stops it without further side effects.
//!
//! - [`countdown`]: one tick per real-time second
//! - [`presence`]: periodic face-presence polling
//! - [`fullscreen`]: fullscreen exit detection and corrective re-entry

pub mod countdown;
pub mod fullscreen;
pub mod presence;

pub use countdown::{TICK_PERIOD, run_countdown};
pub use fullscreen::{FULLSCREEN_EXIT_MESSAGE, FullscreenGuard};
pub use presence::PresenceAdapter;
