//! Switchroom Rules and Environment Abstraction
//!
//! This crate holds everything a strategy author is allowed to see, plus the
//! environment hooks the engine uses to stay reproducible:
//!
//! - **Rules**: the capability traits a strategy implements (`Strategy`,
//!   `Prisoner`) and consumes (`Room`, `SwitchButton`).
//! - **Shout**: the single one-shot completion signal a prisoner may raise.
//! - **Context**: randomness streams, task spawning and cooperative yielding.
//!
//! A strategy never receives anything else. In particular there is no way to
//! end the process or look at another session from inside `Prisoner::enter`.
//!
//! # Example
//!
//! ```ignore
//! use switchroom_env::{Prisoner, Room, Shouter, Strategy};
//!
//! struct Lazy;
//!
//! impl Strategy for Lazy {
//!     fn new_prisoner(&self, _number: usize, _shout: Shouter) -> Box<dyn Prisoner> {
//!         Box::new(LazyPrisoner)
//!     }
//! }
//!
//! struct LazyPrisoner;
//!
//! impl Prisoner for LazyPrisoner {
//!     fn enter(&mut self, room: &mut dyn Room) {
//!         let _ = room.take_switch_a().state();
//!     }
//! }
//! ```

mod context;
mod rule;
mod shout;
mod types;
mod error;
mod tokio_impl;

pub use context::GameContext;
pub use rule::{Prisoner, Room, Strategy, SwitchButton, TOTAL_PRISONERS};
pub use shout::{shout_channel, Shout, ShoutProbe, ShoutReceiver, Shouter, TRIUMPH};
pub use types::SessionId;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
