//! Game sessions: prisoners, the entry loop and completion detection.
//!
//! A session runs as two detached tasks:
//!
//! ```text
//!  entry loop ── pick prisoner ── lock/copy room ── enter() ── lock/commit ──┐
//!      ▲                                                                    │
//!      └──────────────── until success / stop / shout / step limit ◄────────┘
//!
//!  watcher ── wait for (shout | stop) ── wait for loop exit ── check() ── log result ── outcome
//! ```
//!
//! The entry loop issues one turn at a time. The prisoner's decision logic
//! only ever sees a private copy of the room, so it runs synchronously and
//! without locks even though observers may query the session concurrently.

use crate::barrier::{CreationGate, OpenGate};
use crate::error::CoreError;
use crate::lock;
use crate::logger::GameLogger;
use crate::result::{GameResult, MSG_FAILED, MSG_PASSED};
use crate::room::RoomState;
use crate::schedule::{EntryPolicy, FailureKind, Verdict};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use switchroom_env::{
    shout_channel, EnvError, GameContext, Prisoner, SessionId, ShoutProbe, ShoutReceiver, Shouter,
    Strategy,
};
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

/// Configuration for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Session identifier (also the random stream id)
    pub id: SessionId,

    /// Entry scheduling policy
    pub policy: EntryPolicy,

    /// Number of prisoners
    pub prisoners: usize,

    /// Stop after this many steps (None = run until shout or stop)
    pub step_limit: Option<u64>,
}

impl SessionConfig {
    pub fn new(id: SessionId, policy: EntryPolicy, prisoners: usize) -> Self {
        Self {
            id,
            policy,
            prisoners,
            step_limit: None,
        }
    }

    pub fn fair(id: SessionId, prisoners: usize) -> Self {
        Self::new(id, EntryPolicy::Fair, prisoners)
    }

    pub fn mortal(id: SessionId, prisoners: usize) -> Self {
        Self::new(id, EntryPolicy::Mortal, prisoners)
    }

    /// Sets the step limit.
    pub fn with_step_limit(mut self, steps: u64) -> Self {
        self.step_limit = Some(steps);
        self
    }
}

/// Warden's bookkeeping for one prisoner.
#[derive(Debug)]
pub struct PrisonerState {
    number: usize,
    entered: AtomicU64,
}

impl PrisonerState {
    fn new(number: usize) -> Self {
        Self {
            number,
            entered: AtomicU64::new(0),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// How many times this prisoner has entered the room.
    pub fn entered(&self) -> u64 {
        self.entered.load(Ordering::SeqCst)
    }
}

/// What ended a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A prisoner shouted; `verified` is whether everyone had entered by then
    Triumph { verified: bool },

    /// Stopped without a shout (external stop or step limit)
    Halted,
}

/// One game: a room, its prisoners and their schedule.
///
/// Generic over the context so the same session runs on OS entropy or on a
/// seeded context.
pub struct GameSession<Ctx: GameContext> {
    config: SessionConfig,
    context: Arc<Ctx>,
    logger: GameLogger,

    /// Authoritative room; locked only to copy out and to commit
    room: Mutex<RoomState>,
    states: Vec<PrisonerState>,

    steps: AtomicU64,
    used: AtomicU64,
    success: AtomicU64,
    stopped: AtomicBool,
    halt: watch::Sender<bool>,

    /// Set once the entry loop has committed its last turn and exited
    settled: watch::Sender<bool>,

    /// Scheduling stream, taken by the entry loop on start
    entry_rng: Mutex<Option<ChaCha8Rng>>,
    excluded: OnceLock<usize>,
    shouts: OnceLock<ShoutProbe>,
}

impl<Ctx: GameContext> GameSession<Ctx> {
    /// Creates a session with a freshly randomized room.
    pub fn new(config: SessionConfig, context: Arc<Ctx>, logger: GameLogger) -> Result<Self, CoreError> {
        if config.prisoners == 0 {
            return Err(EnvError::InvalidParticipants(config.prisoners).into());
        }
        if config.prisoners < config.policy.min_prisoners() {
            return Err(CoreError::MortalNeedsTwo(config.prisoners));
        }

        let mut rng = context.derive_rng(config.id.0);
        let room = RoomState::random(&mut rng);
        let states = (0..config.prisoners).map(PrisonerState::new).collect();
        let (halt, _) = watch::channel(false);
        let (settled, _) = watch::channel(false);

        Ok(Self {
            config,
            context,
            logger,
            room: Mutex::new(room),
            states,
            steps: AtomicU64::new(0),
            used: AtomicU64::new(0),
            success: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            halt,
            settled,
            entry_rng: Mutex::new(Some(rng)),
            excluded: OnceLock::new(),
            shouts: OnceLock::new(),
        })
    }

    /// Creates an Arc-wrapped session, ready to start.
    pub fn shared(config: SessionConfig, context: Arc<Ctx>, logger: GameLogger) -> Result<Arc<Self>, CoreError> {
        Self::new(config, context, logger).map(Arc::new)
    }

    pub fn id(&self) -> SessionId {
        self.config.id
    }

    pub fn policy(&self) -> EntryPolicy {
        self.config.policy
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn prisoners(&self) -> &[PrisonerState] {
        &self.states
    }

    /// Prisoner never scheduled by a Mortal session (set on start).
    pub fn excluded(&self) -> Option<usize> {
        self.excluded.get().copied()
    }

    /// Copy of the current room.
    pub fn room(&self) -> RoomState {
        lock(&self.room).clone()
    }

    /// Creates the prisoners, then spawns the entry loop and the watcher.
    ///
    /// Every prisoner creation passes through `gate`; with a barrier ticket
    /// this suspends until the barrier releases this session. The gate is
    /// dropped once all prisoners exist, withdrawing the session from later
    /// barrier rounds.
    pub async fn start<G: CreationGate>(
        self: &Arc<Self>,
        strategy: &dyn Strategy,
        gate: G,
    ) -> Result<GameHandle, CoreError> {
        let mut rng = lock(&self.entry_rng)
            .take()
            .ok_or(CoreError::AlreadyStarted(self.config.id))?;

        let (shouter, shouts) = shout_channel();
        let prisoners = self.initialize(strategy, shouter, gate).await?;

        let excluded = self.config.policy.pick_excluded(&mut rng, prisoners.len());
        if let Some(index) = excluded {
            let _ = self.excluded.set(index);
            debug!(game = %self.config.id, excluded = index, "Prisoner locked out");
        }

        let probe = shouts.probe();
        let _ = self.shouts.set(probe.clone());

        let (done_tx, done_rx) = oneshot::channel();
        self.context
            .spawn("game-watcher", Arc::clone(self).watch_completion(shouts, done_tx));
        self.context
            .spawn("game-entries", Arc::clone(self).run_entries(prisoners, rng, excluded, probe));

        Ok(GameHandle {
            id: self.config.id,
            policy: self.config.policy,
            outcome: done_rx,
        })
    }

    /// Starts without a barrier and waits for the verdict.
    pub async fn play(self: &Arc<Self>, strategy: &dyn Strategy) -> Result<Verdict, CoreError> {
        let handle = self.start(strategy, OpenGate).await?;
        Ok(handle.verdict().await)
    }

    async fn initialize<G: CreationGate>(
        &self,
        strategy: &dyn Strategy,
        shouter: Shouter,
        mut gate: G,
    ) -> Result<Vec<Box<dyn Prisoner>>, CoreError> {
        let mut prisoners = Vec::with_capacity(self.states.len());
        for state in &self.states {
            let admission = gate.admit().await?;
            prisoners.push(strategy.new_prisoner(state.number, shouter.clone()));
            admission.complete();
        }
        Ok(prisoners)
    }

    async fn watch_completion(self: Arc<Self>, shouts: ShoutReceiver, done: oneshot::Sender<SessionOutcome>) {
        let shouted = tokio::select! {
            biased;
            _ = shouts.recv() => true,
            _ = self.halted() => false,
        };
        // The shouting turn may still be inside enter(); judge its committed room
        self.settled().await;

        let outcome = if shouted {
            let verified = self.check();
            if verified {
                self.success.fetch_add(1, Ordering::SeqCst);
            }
            SessionOutcome::Triumph { verified }
        } else {
            SessionOutcome::Halted
        };

        self.stop();
        self.logger.result(&self.result());

        let extra = shouts.probe().extra_shouts();
        if extra > 0 {
            warn!(game = %self.config.id, extra, "Ignored repeated shouts");
        }

        let _ = done.send(outcome);
    }

    async fn settled(&self) {
        let mut settled = self.settled.subscribe();
        let _ = settled.wait_for(|done| *done).await;
    }

    async fn halted(&self) {
        let mut halt = self.halt.subscribe();
        // Err only if the sender is gone, which cannot happen while `self` lives
        let _ = halt.wait_for(|stopped| *stopped).await;
    }

    async fn run_entries(
        self: Arc<Self>,
        mut prisoners: Vec<Box<dyn Prisoner>>,
        mut rng: ChaCha8Rng,
        excluded: Option<usize>,
        shouts: ShoutProbe,
    ) {
        let count = prisoners.len();
        loop {
            let index = rng.gen_range(0..count);
            if excluded == Some(index) {
                continue;
            }

            self.let_enter(index, prisoners[index].as_mut());

            // A shout freezes the game so the watcher judges this very state
            if self.is_success() || self.is_stopped() || shouts.is_raised() {
                break;
            }
            if let Some(limit) = self.config.step_limit {
                if self.steps() >= limit {
                    debug!(game = %self.config.id, limit, "Step limit reached");
                    self.stop();
                    break;
                }
            }

            self.context.yield_turn().await;
        }
        self.settled.send_replace(true);
    }

    /// Lets prisoner `index` take one turn in the room.
    pub fn let_enter(&self, index: usize, prisoner: &mut dyn Prisoner) {
        self.steps.fetch_add(1, Ordering::SeqCst);

        let state = &self.states[index];
        state.entered.fetch_add(1, Ordering::SeqCst);
        self.logger.prisoner_entering(state.number);

        let mut turn = lock(&self.room).prepare_entering_by(state.number, &self.logger);
        prisoner.enter(&mut turn);
        let committed = turn.into_state();

        self.used.fetch_max(committed.used_switches(), Ordering::SeqCst);
        self.logger.switch_snapshot(&committed);
        *lock(&self.room) = committed;
    }

    /// True iff every prisoner has entered at least once.
    pub fn check(&self) -> bool {
        self.states.iter().all(|state| state.entered() >= 1)
    }

    pub fn is_success(&self) -> bool {
        self.success.load(Ordering::SeqCst) > 0
    }

    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::SeqCst)
    }

    /// Number of distinct switches ever taken. Never decreases.
    pub fn used_switches(&self) -> u64 {
        self.used.load(Ordering::SeqCst)
    }

    /// Shouts rejected after the first one.
    pub fn extra_shouts(&self) -> u64 {
        self.shouts.get().map_or(0, ShoutProbe::extra_shouts)
    }

    /// Asks the entry loop to finish after its in-flight turn.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.halt.send_replace(true);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Current result of the session, scored.
    pub fn result(&self) -> GameResult {
        let success = self.is_success();
        GameResult {
            success,
            message: if success { MSG_PASSED } else { MSG_FAILED }.to_string(),
            steps: self.steps(),
            used_switches: self.used_switches(),
            score: 0,
        }
        .calc_score()
    }
}

impl<Ctx: GameContext> std::fmt::Debug for GameSession<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("config", &self.config)
            .field("steps", &self.steps())
            .field("used_switches", &self.used_switches())
            .field("success", &self.is_success())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Handle to a started session.
#[derive(Debug)]
pub struct GameHandle {
    id: SessionId,
    policy: EntryPolicy,
    outcome: oneshot::Receiver<SessionOutcome>,
}

impl GameHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn policy(&self) -> EntryPolicy {
        self.policy
    }

    /// Waits for the session to end. None if the watcher vanished.
    pub async fn outcome(self) -> Option<SessionOutcome> {
        self.outcome.await.ok()
    }

    /// Waits for the session to end and judges it by its policy.
    pub async fn verdict(self) -> Verdict {
        let policy = self.policy;
        match self.outcome().await {
            Some(outcome) => policy.judge(outcome),
            None => Verdict::Failed(FailureKind::Abandoned),
        }
    }
}
