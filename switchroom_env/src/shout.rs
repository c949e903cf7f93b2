//! The one-shot completion signal.
//!
//! Every prisoner of a session holds a clone of the same [`Shouter`]. The
//! first `shout()` raises the session's triumph; any later shout is rejected
//! and counted. Shouting never blocks, so a prisoner can call it from inside
//! `Prisoner::enter`.

use crate::error::EnvError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// What a prisoner can say to the warden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shout;

/// The only value of [`Shout`].
pub const TRIUMPH: Shout = Shout;

#[derive(Debug, Default)]
struct ShoutState {
    raised: AtomicBool,
    extra: AtomicU64,
    notify: Notify,
}

/// Creates a connected shouter/receiver pair for one session.
pub fn shout_channel() -> (Shouter, ShoutReceiver) {
    let state = Arc::new(ShoutState::default());
    (
        Shouter { state: Arc::clone(&state) },
        ShoutReceiver { state },
    )
}

/// Sending half, handed to every prisoner of a session.
#[derive(Debug, Clone)]
pub struct Shouter {
    state: Arc<ShoutState>,
}

impl Shouter {
    /// Claims triumph.
    ///
    /// # Returns
    /// * `Ok(())` - This was the first shout of the session
    /// * `Err(EnvError::AlreadyShouted)` - Someone already shouted; ignored
    pub fn shout(&self) -> Result<(), EnvError> {
        if self.state.raised.swap(true, Ordering::AcqRel) {
            self.state.extra.fetch_add(1, Ordering::Relaxed);
            return Err(EnvError::AlreadyShouted);
        }
        self.state.notify.notify_one();
        Ok(())
    }
}

/// Receiving half, owned by the session's completion watcher.
#[derive(Debug)]
pub struct ShoutReceiver {
    state: Arc<ShoutState>,
}

impl ShoutReceiver {
    /// Waits until the triumph is raised.
    pub async fn recv(&self) -> Shout {
        loop {
            let notified = self.state.notify.notified();
            if self.state.raised.load(Ordering::Acquire) {
                return TRIUMPH;
            }
            notified.await;
        }
    }

    /// Returns a cheap read-only view of the signal.
    pub fn probe(&self) -> ShoutProbe {
        ShoutProbe { state: Arc::clone(&self.state) }
    }
}

/// Read-only view used by the entry loop to stop dispatching after a shout.
#[derive(Debug, Clone)]
pub struct ShoutProbe {
    state: Arc<ShoutState>,
}

impl ShoutProbe {
    /// True once any prisoner has shouted.
    pub fn is_raised(&self) -> bool {
        self.state.raised.load(Ordering::Acquire)
    }

    /// Number of shouts rejected after the first one.
    pub fn extra_shouts(&self) -> u64 {
        self.state.extra.load(Ordering::Relaxed)
    }
}
