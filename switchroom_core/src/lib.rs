//! Switchroom Core - Concurrent Game-Session Engine
//!
//! Runs the prisoners-and-switches puzzle against pluggable strategies under
//! an adversarial scheduler:
//! 1. **Room**: two switches, copied into each turn and committed back
//! 2. **Session**: random entry scheduling (Fair or Mortal), shout detection, scoring
//! 3. **Barrier**: lock-stepped, reshuffled prisoner creation across a whole batch
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    SynchronizationBarrier                    │
//! │      round k: shuffle → release #7 → ack → release #2 ...    │
//! └──────┬───────────────────────┬───────────────────────┬───────┘
//!        │ ticket                │ ticket                │ ticket
//!  ┌─────▼──────┐          ┌─────▼──────┐          ┌─────▼──────┐
//!  │ GameSession│          │ GameSession│          │ GameSession│
//!  │  entry loop│   ...    │  entry loop│   ...    │  entry loop│
//!  │  watcher   │          │  watcher   │          │  watcher   │
//!  └─────┬──────┘          └─────┬──────┘          └─────┬──────┘
//!        └───────────── GameResult::merge ──────────────┘
//! ```

pub mod switch;
pub mod room;
pub mod logger;
pub mod result;
pub mod barrier;
pub mod session;
pub mod schedule;
mod error;

// Re-export key types for convenience
pub use barrier::{Admission, BarrierTicket, CreationGate, OpenGate, ReleaseReport, SynchronizationBarrier};
pub use error::{BarrierError, CoreError};
pub use logger::{GameLogger, LogLevel, LogSink, MemorySink, TracingSink};
pub use result::{GameResult, MAX_STEPS, MSG_FAILED, MSG_PASSED, MSG_TIMED_OUT};
pub use room::{RoomState, TurnRoom};
pub use schedule::{EntryPolicy, FailureKind, Verdict};
pub use session::{GameHandle, GameSession, PrisonerState, SessionConfig, SessionOutcome};
pub use switch::{LoggedSwitch, SwitchState};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the data if a panicking holder poisoned it.
///
/// Every critical section in this crate leaves its data consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
