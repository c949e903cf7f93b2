//! Cross-game synchronization barrier.
//!
//! Every session of a batch registers once and then asks for a release
//! before creating each of its prisoners. When all sessions have registered,
//! the barrier runs rounds: each round reshuffles the registrants and
//! releases them one at a time, waiting for each prisoner creation to finish
//! before releasing the next. A strategy therefore cannot learn which game a
//! prisoner belongs to from the order in which `new_prisoner` is called.
//!
//! ```text
//!  round 0:  shuffle → [#3, #0, #2, #1]
//!            release #3 ──► new_prisoner(0) ──► ack
//!            release #0 ──► new_prisoner(0) ──► ack
//!            ...
//!  round 1:  shuffle → [#1, #3, #0, #2]
//!            release #1 ──► new_prisoner(1) ──► ack
//!            ...
//! ```

use crate::error::BarrierError;
use crate::lock;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

/// Permission to create one prisoner.
///
/// Dropping it (or calling [`Admission::complete`]) tells the barrier the
/// creation is finished so the next registrant can be released.
#[derive(Debug)]
pub struct Admission {
    ack: Option<oneshot::Sender<()>>,
}

impl Admission {
    /// An admission that nobody is waiting on.
    pub fn open() -> Self {
        Self { ack: None }
    }

    /// Marks the creation as finished.
    pub fn complete(mut self) {
        self.acknowledge();
    }

    fn acknowledge(&mut self) {
        if let Some(ack) = self.ack.take() {
            let _ = ack.send(());
        }
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.acknowledge();
    }
}

/// Gate a session passes through before each prisoner creation.
#[async_trait]
pub trait CreationGate: Send {
    async fn admit(&mut self) -> Result<Admission, BarrierError>;
}

/// Gate that admits immediately. Used for sessions run on their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenGate;

#[async_trait]
impl CreationGate for OpenGate {
    async fn admit(&mut self) -> Result<Admission, BarrierError> {
        Ok(Admission::open())
    }
}

/// A session's registration with the barrier.
///
/// Dropping the ticket withdraws the session; later rounds skip it.
#[derive(Debug)]
pub struct BarrierTicket {
    id: usize,
    releases: mpsc::Receiver<oneshot::Sender<()>>,
}

impl BarrierTicket {
    /// Registration order, starting at 0.
    pub fn id(&self) -> usize {
        self.id
    }
}

#[async_trait]
impl CreationGate for BarrierTicket {
    async fn admit(&mut self) -> Result<Admission, BarrierError> {
        self.releases
            .recv()
            .await
            .map(|ack| Admission { ack: Some(ack) })
            .ok_or(BarrierError::Closed)
    }
}

#[derive(Debug, Clone)]
struct Registrant {
    id: usize,
    release_tx: mpsc::Sender<oneshot::Sender<()>>,
}

/// Release order observed during a run, one entry per round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub rounds: Vec<Vec<usize>>,
}

impl ReleaseReport {
    /// How many times registrant `id` was released over all rounds.
    pub fn releases_of(&self, id: usize) -> usize {
        self.rounds
            .iter()
            .map(|round| round.iter().filter(|r| **r == id).count())
            .sum()
    }

    /// Total number of releases.
    pub fn total(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }
}

/// Lock-stepped, reshuffled release of prisoner creations across a batch.
pub struct SynchronizationBarrier {
    expected: usize,
    registrants: Mutex<Vec<Registrant>>,
    /// Count-down of registrations still missing
    remaining: watch::Sender<usize>,
    rng: Mutex<ChaCha8Rng>,
}

impl SynchronizationBarrier {
    /// Creates a barrier waiting for `expected` registrants.
    pub fn new(expected: usize, rng: ChaCha8Rng) -> Self {
        let (remaining, _) = watch::channel(expected);
        Self {
            expected,
            registrants: Mutex::new(Vec::with_capacity(expected)),
            remaining,
            rng: Mutex::new(rng),
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn registered(&self) -> usize {
        lock(&self.registrants).len()
    }

    /// Registers one session.
    ///
    /// # Returns
    /// * `Ok(ticket)` - Pass the ticket to the session as its creation gate
    /// * `Err(BarrierError::Full)` - All `expected` slots are taken
    pub fn register(&self) -> Result<BarrierTicket, BarrierError> {
        let mut registrants = lock(&self.registrants);
        if registrants.len() >= self.expected {
            return Err(BarrierError::Full {
                expected: self.expected,
            });
        }

        let id = registrants.len();
        let (release_tx, releases) = mpsc::channel(1);
        registrants.push(Registrant { id, release_tx });
        self.remaining.send_modify(|n| *n = n.saturating_sub(1));

        Ok(BarrierTicket { id, releases })
    }

    /// Waits until every expected registrant has registered.
    pub async fn ready(&self) {
        let mut remaining = self.remaining.subscribe();
        // Err only if the sender is gone, which cannot happen while `self` lives
        let _ = remaining.wait_for(|n| *n == 0).await;
    }

    fn shuffle(&self) -> Vec<Registrant> {
        let mut registrants = lock(&self.registrants);
        let mut rng = lock(&self.rng);
        registrants.shuffle(&mut *rng);
        registrants.clone()
    }

    /// Runs one round: reshuffle, then release every registrant in turn.
    ///
    /// Returns the ids released, in order. Withdrawn registrants are skipped.
    pub async fn release_once(&self) -> Vec<usize> {
        let order = self.shuffle();
        let mut released = Vec::with_capacity(order.len());

        for registrant in order {
            let (ack_tx, ack_rx) = oneshot::channel();
            if registrant.release_tx.send(ack_tx).await.is_err() {
                debug!(registrant = registrant.id, "registrant withdrawn, skipping");
                continue;
            }

            // Next release only after this creation finished
            match ack_rx.await {
                Ok(()) => released.push(registrant.id),
                Err(_) => debug!(registrant = registrant.id, "ticket dropped before admission"),
            }
        }

        released
    }

    /// Waits for all registrations, then runs `rounds` release rounds.
    pub async fn release_rounds(&self, rounds: usize) -> ReleaseReport {
        self.ready().await;
        info!(registrants = self.expected, rounds, "Barrier ready, releasing");

        let mut report = ReleaseReport::default();
        for round in 0..rounds {
            let released = self.release_once().await;
            debug!(round, released = released.len(), "Barrier round drained");
            report.rounds.push(released);
        }
        report
    }
}

impl std::fmt::Debug for SynchronizationBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynchronizationBarrier")
            .field("expected", &self.expected)
            .field("registered", &self.registered())
            .finish()
    }
}
