//! Batch runner - plays many games of one strategy against a shared barrier.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use switchroom_core::{
    CoreError, EntryPolicy, FailureKind, GameLogger, GameResult, GameSession, LogLevel, LogSink,
    ReleaseReport, SessionConfig, SynchronizationBarrier, TracingSink, Verdict, MAX_STEPS,
    MSG_FAILED, MSG_PASSED, MSG_TIMED_OUT,
};
use switchroom_env::{GameContext, SessionId, Strategy, TOTAL_PRISONERS};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Default wall-clock budget for a whole batch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// RNG stream reserved for the barrier's shuffles; session streams use their ids.
pub const BARRIER_STREAM: u64 = u64::MAX;

/// How long to wait for the barrier's report once every game has settled.
const RELEASE_REPORT_GRACE: Duration = Duration::from_secs(1);

/// Batch configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of fair games
    pub fair_games: usize,

    /// Number of mortal games
    pub mortal_games: usize,

    /// Prisoners per game
    pub prisoners: usize,

    /// Deadline for the whole batch
    pub timeout: Duration,

    /// Keep playing after a failure
    pub patient: bool,

    /// Game event verbosity
    pub log_level: LogLevel,

    /// Step limit for mortal games
    pub mortal_steps: u64,

    /// Optional step limit for fair games
    pub fair_steps: Option<u64>,

    /// Master seed; None runs on OS entropy
    pub seed: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            fair_games: 100,
            mortal_games: 100,
            prisoners: TOTAL_PRISONERS,
            timeout: DEFAULT_TIMEOUT,
            patient: false,
            log_level: LogLevel::Result,
            mortal_steps: MAX_STEPS,
            fair_steps: None,
            seed: None,
        }
    }
}

impl BatchConfig {
    /// Sets the number of fair and mortal games.
    pub fn with_games(mut self, fair: usize, mortal: usize) -> Self {
        self.fair_games = fair;
        self.mortal_games = mortal;
        self
    }

    /// Sets the number of prisoners per game.
    pub fn with_prisoners(mut self, prisoners: usize) -> Self {
        self.prisoners = prisoners;
        self
    }

    /// Sets the batch deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables patient mode.
    pub fn with_patient(mut self, patient: bool) -> Self {
        self.patient = patient;
        self
    }

    /// Sets the game log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Sets the mortal step limit.
    pub fn with_mortal_steps(mut self, steps: u64) -> Self {
        self.mortal_steps = steps;
        self
    }

    /// Caps fair games at `steps` entries.
    pub fn with_fair_steps(mut self, steps: u64) -> Self {
        self.fair_steps = Some(steps);
        self
    }

    /// Records the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Total number of games in the batch.
    pub fn total_games(&self) -> usize {
        self.fair_games + self.mortal_games
    }

    /// Configuration of the game at `index` (fair games first).
    pub fn session_config(&self, index: usize) -> SessionConfig {
        let id = SessionId::from_index(index);
        if index < self.fair_games {
            let config = SessionConfig::fair(id, self.prisoners);
            match self.fair_steps {
                Some(steps) => config.with_step_limit(steps),
                None => config,
            }
        } else {
            SessionConfig::mortal(id, self.prisoners).with_step_limit(self.mortal_steps)
        }
    }
}

/// How one game of the batch ended.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub id: SessionId,
    pub policy: EntryPolicy,

    /// None when the batch ended before this game did
    pub verdict: Option<Verdict>,

    pub result: GameResult,
}

impl SessionReport {
    /// Failure of this game, counting unfinished games as `unfinished`.
    pub fn failure(&self, unfinished: Option<FailureKind>) -> Option<FailureKind> {
        match self.verdict {
            Some(verdict) => verdict.failure(),
            None => unfinished,
        }
    }
}

/// Results from running a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Aggregated result printed on stdout
    pub result: GameResult,

    /// Strategy that was played
    pub strategy: String,

    /// Seed used, if any
    pub seed: Option<u64>,

    /// True when the deadline expired
    pub timed_out: bool,

    /// Per-game details
    pub sessions: Vec<SessionReport>,

    /// Barrier release order, when the barrier finished
    #[serde(skip)]
    pub releases: Option<ReleaseReport>,
}

impl BatchReport {
    /// Report for a batch that could not be set up; no game was played.
    pub fn setup_failed(strategy: &str, seed: Option<u64>, error: &CoreError) -> Self {
        Self {
            result: GameResult::new(false, error.to_string()),
            strategy: strategy.to_string(),
            seed,
            timed_out: false,
            sessions: Vec::new(),
            releases: None,
        }
    }

    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        if self.result.success {
            0
        } else {
            1
        }
    }

    /// Games that failed, with unfinished games counted per the deadline.
    pub fn failures(&self) -> Vec<(SessionId, FailureKind)> {
        let unfinished = self.timed_out.then_some(FailureKind::TimedOut);
        self.sessions
            .iter()
            .filter_map(|s| s.failure(unfinished).map(|kind| (s.id, kind)))
            .collect()
    }

    /// Number of games that passed.
    pub fn passed(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.verdict.is_some_and(|v| v.is_passed()))
            .count()
    }
}

/// Plays batches of games.
pub struct BatchRunner<Ctx: GameContext> {
    config: BatchConfig,
    context: Arc<Ctx>,
    sink: Arc<dyn LogSink>,
}

impl<Ctx: GameContext> BatchRunner<Ctx> {
    /// Creates a new batch runner logging game events through tracing.
    pub fn new(config: BatchConfig, context: Arc<Ctx>) -> Self {
        Self {
            config,
            context,
            sink: Arc::new(TracingSink),
        }
    }

    /// Routes game event lines to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Runs one batch of `strategy` and returns the aggregated report.
    ///
    /// Every game registers with one barrier, so prisoner creation across the
    /// batch happens in shuffled lock-step rounds. The batch ends when every
    /// game has a verdict, at the first failure unless patient, or at the
    /// deadline. Games still running at that point are stopped and abandoned.
    pub async fn run(&self, name: &str, strategy: Arc<dyn Strategy>) -> Result<BatchReport, CoreError> {
        let config = &self.config;
        info!(
            "Starting batch: {} fair + {} mortal games, {} prisoners, strategy={}",
            config.fair_games, config.mortal_games, config.prisoners, name
        );

        let sessions = (0..config.total_games())
            .map(|index| {
                let session_config = config.session_config(index);
                let logger = GameLogger::new(
                    session_config.id.to_string(),
                    config.log_level,
                    Arc::clone(&self.sink),
                );
                GameSession::shared(session_config, Arc::clone(&self.context), logger)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let barrier = Arc::new(SynchronizationBarrier::new(
            sessions.len(),
            self.context.derive_rng(BARRIER_STREAM),
        ));

        let (verdict_tx, mut verdict_rx) = mpsc::unbounded_channel();
        for (index, session) in sessions.iter().enumerate() {
            let ticket = barrier.register()?;
            let session = Arc::clone(session);
            let strategy = Arc::clone(&strategy);
            let verdict_tx = verdict_tx.clone();
            self.context.spawn("game", async move {
                let verdict = match session.start(strategy.as_ref(), ticket).await {
                    Ok(handle) => handle.verdict().await,
                    Err(e) => {
                        warn!(game = %session.id(), error = %e, "Game failed to start");
                        Verdict::Failed(FailureKind::SetupFailed)
                    }
                };
                let _ = verdict_tx.send((index, verdict));
            });
        }
        drop(verdict_tx);

        let (report_tx, report_rx) = oneshot::channel();
        {
            let barrier = Arc::clone(&barrier);
            let rounds = config.prisoners;
            self.context.spawn("barrier", async move {
                let report = barrier.release_rounds(rounds).await;
                let _ = report_tx.send(report);
            });
        }

        let mut verdicts: Vec<Option<Verdict>> = vec![None; sessions.len()];
        let patient = config.patient;
        let collect = async {
            while let Some((index, verdict)) = verdict_rx.recv().await {
                verdicts[index] = Some(verdict);
                match verdict {
                    Verdict::Passed => debug!(game = %sessions[index].id(), "Game passed"),
                    Verdict::Failed(kind) => {
                        warn!(game = %sessions[index].id(), reason = %kind, "Game failed");
                        if !patient {
                            return;
                        }
                    }
                }
            }
        };
        let timed_out = tokio::time::timeout(config.timeout, collect).await.is_err();
        if timed_out {
            warn!("Batch deadline of {:?} expired", config.timeout);
        }

        // Anything still running is abandoned.
        for session in &sessions {
            session.stop();
        }

        let releases = if timed_out {
            None
        } else {
            tokio::time::timeout(RELEASE_REPORT_GRACE, report_rx)
                .await
                .ok()
                .and_then(Result::ok)
        };

        let reports: Vec<SessionReport> = sessions
            .iter()
            .zip(verdicts)
            .map(|(session, verdict)| {
                let mut result = session.result();
                if verdict.is_none() && timed_out {
                    result.message = MSG_TIMED_OUT.to_string();
                }
                SessionReport {
                    id: session.id(),
                    policy: session.policy(),
                    verdict,
                    result,
                }
            })
            .collect();

        let all_passed = !timed_out
            && reports
                .iter()
                .all(|r| r.verdict.is_some_and(|v| v.is_passed()));
        let message = if timed_out {
            MSG_TIMED_OUT
        } else if all_passed {
            MSG_PASSED
        } else {
            MSG_FAILED
        };

        // Only fair games carry a score; mortal games never succeed.
        let result = GameResult::new(all_passed, message).merge_all(
            reports
                .iter()
                .filter(|r| r.policy == EntryPolicy::Fair)
                .map(|r| &r.result),
        );

        info!(
            "Batch finished: success={} steps={} score={}",
            result.success, result.steps, result.score
        );

        Ok(BatchReport {
            result,
            strategy: name.to_string(),
            seed: config.seed,
            timed_out,
            sessions: reports,
            releases,
        })
    }
}
