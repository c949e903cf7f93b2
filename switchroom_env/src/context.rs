//! Core environment context trait for switchroom sessions.

use async_trait::async_trait;
use rand_chacha::ChaCha8Rng;
use std::future::Future;

/// The central interface for environment interaction.
///
/// Abstracts the sources of non-determinism a game session touches so the
/// same engine runs against OS entropy in production and against a single
/// master seed when a run has to be reproduced.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - `tokio::spawn`, entropy-seeded streams
/// - **Seeded**: `SeededContext` (in `switchroom_sim`) - streams derived from one seed
#[async_trait]
pub trait GameContext: Send + Sync + 'static {
    /// Returns an independent random stream.
    ///
    /// Each session asks for its own stream (keyed by its index) so that
    /// adding sessions to a batch does not perturb the others. Within one
    /// seeded context the same `stream` always yields the same sequence.
    fn derive_rng(&self, stream: u64) -> ChaCha8Rng;

    /// Spawns a background task.
    ///
    /// Tasks are detached; the engine never joins them.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Gives other tasks a chance to run between two turns.
    async fn yield_turn(&self);

    /// Returns the context's seed (for logging/debugging).
    ///
    /// Production contexts return 0.
    fn seed(&self) -> u64;
}
