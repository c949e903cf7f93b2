//! Error types for the switchroom environment abstraction.

use thiserror::Error;

/// Errors that can occur at the rules boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// The session's triumph was already raised; only the first shout counts
    #[error("Triumph already shouted")]
    AlreadyShouted,

    /// A game was configured with an unusable number of prisoners
    #[error("Invalid number of prisoners: {0}")]
    InvalidParticipants(usize),
}
