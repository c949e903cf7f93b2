//! Switchroom batch simulator CLI
//!
//! Plays a strategy against fair and mortal games and prints the aggregated
//! result as JSON on stdout.

use clap::Parser;
use std::time::Duration;
use switchroom_core::{CoreError, LogLevel, MAX_STEPS};
use switchroom_env::{TokioContext, TOTAL_PRISONERS};
use switchroom_sim::{BatchConfig, BatchReport, BatchRunner, SeededContext, StrategyId};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "switchroom-sim")]
#[command(about = "Prisoners-and-switches strategy simulator", long_about = None)]
struct Args {
    /// Game events to log (silent, result, changes, all, debug)
    #[arg(short, long, default_value = "result")]
    log_level: LogLevel,

    /// Keep playing after a failed game
    #[arg(short, long)]
    patient: bool,

    /// Strategy to play (counting, hasty, silent)
    #[arg(short = 'S', long, default_value = "counting")]
    strategy: StrategyId,

    /// Master seed for reproducible rooms and schedules (0 = OS entropy)
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Deadline for the whole batch in seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Number of fair games
    #[arg(long, default_value_t = 100)]
    fair_games: usize,

    /// Number of mortal games
    #[arg(long, default_value_t = 100)]
    mortal_games: usize,

    /// Prisoners per game
    #[arg(long, default_value_t = TOTAL_PRISONERS)]
    prisoners: usize,

    /// Step limit after which a silent mortal game passes
    #[arg(long, default_value_t = MAX_STEPS)]
    mortal_steps: u64,

    /// Write the per-game report to this JSON file
    #[arg(long)]
    report: Option<String>,
}

async fn run(args: &Args) -> Result<BatchReport, CoreError> {
    let mut config = BatchConfig::default()
        .with_games(args.fair_games, args.mortal_games)
        .with_prisoners(args.prisoners)
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_patient(args.patient)
        .with_log_level(args.log_level)
        .with_mortal_steps(args.mortal_steps);

    let strategy = args.strategy.build(args.prisoners);
    let name = args.strategy.name();

    if args.seed == 0 {
        BatchRunner::new(config, TokioContext::shared())
            .run(name, strategy)
            .await
    } else {
        config = config.with_seed(args.seed);
        BatchRunner::new(config, SeededContext::shared(args.seed))
            .run(name, strategy)
            .await
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for the result
    let level = if args.log_level == LogLevel::Debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Switchroom simulator v{}", env!("CARGO_PKG_VERSION"));
    info!("Strategy: {} - {}", args.strategy.name(), args.strategy.description());

    let report = match run(&args).await {
        Ok(report) => report,
        Err(e) => {
            error!("Batch setup failed: {}", e);
            let seed = (args.seed != 0).then_some(args.seed);
            BatchReport::setup_failed(args.strategy.name(), seed, &e)
        }
    };

    let failures = report.failures();
    if !failures.is_empty() {
        warn!("{} of {} games failed:", failures.len(), report.sessions.len());
        for (id, kind) in failures.iter().take(10) {
            warn!("  - game {}: {}", id, kind);
        }
    }

    if let Some(path) = &args.report {
        match report.write_to_file(path) {
            Ok(()) => info!("Report written to {}", path),
            Err(e) => error!("{}", e),
        }
    }

    match report.result.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to encode result: {}", e);
            std::process::abort();
        }
    }

    // Abandoned games may still be running; do not wait for them.
    std::process::exit(report.exit_code());
}
