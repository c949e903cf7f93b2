//! Common types for the switchroom environment.

use serde::{Deserialize, Serialize};

/// Identifier of a game session inside a batch.
///
/// Displayed 1-based (`#1`, `#2`, ...) to match the game log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Creates a SessionId from a zero-based batch index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u64 + 1)
    }

    /// Returns the zero-based batch index.
    pub fn index(&self) -> usize {
        self.0.saturating_sub(1) as usize
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
