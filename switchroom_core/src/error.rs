//! Error types for the session engine.

use switchroom_env::{EnvError, SessionId};
use thiserror::Error;

/// Errors raised by the synchronization barrier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BarrierError {
    /// More registrations than the barrier was sized for
    #[error("Barrier full: expected {expected} registrants")]
    Full { expected: usize },

    /// The barrier side of a ticket went away before releasing it
    #[error("Barrier closed before release")]
    Closed,
}

/// Errors that can occur while setting up or starting a session.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Barrier(#[from] BarrierError),

    /// Mortal games exclude one prisoner, so they need somebody else to schedule
    #[error("Mortal game needs at least 2 prisoners, got {0}")]
    MortalNeedsTwo(usize),

    #[error("Game {0} already started")]
    AlreadyStarted(SessionId),
}
