//! Production implementation of GameContext using Tokio.

use crate::GameContext;
use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Production context backed by Tokio and OS entropy.
///
/// Every derived stream is freshly seeded from the OS, so two games never
/// share a sequence and runs are not reproducible.
#[derive(Debug, Default)]
pub struct TokioContext;

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl GameContext for TokioContext {
    fn derive_rng(&self, _stream: u64) -> ChaCha8Rng {
        ChaCha8Rng::from_entropy()
    }

    fn spawn<F>(&self, _name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future);
    }

    async fn yield_turn(&self) {
        tokio::task::yield_now().await;
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}
