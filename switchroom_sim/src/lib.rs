//! Batch simulator for the switchroom puzzle engine.
//!
//! Plays one strategy against a batch of fair and mortal games that all share
//! a single synchronization barrier, then folds the per-game results into one
//! scored [`GameResult`](switchroom_core::GameResult).
//!
//! # Usage
//!
//! ```ignore
//! use switchroom_sim::{BatchConfig, BatchRunner, SeededContext, StrategyId};
//!
//! let config = BatchConfig::default().with_games(10, 10).with_seed(42);
//! let runner = BatchRunner::new(config, SeededContext::shared(42));
//! let report = runner.run("counting", StrategyId::Counting.build(100)).await?;
//! println!("{}", report.result.to_json()?);
//! ```

mod context;
mod export;
mod runner;
pub mod strategies;

pub use context::SeededContext;
pub use export::ExportError;
pub use runner::{BatchConfig, BatchReport, BatchRunner, SessionReport, BARRIER_STREAM, DEFAULT_TIMEOUT};
pub use strategies::{CountingStrategy, HastyStrategy, SilentStrategy, StrategyId};
