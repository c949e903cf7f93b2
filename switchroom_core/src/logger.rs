//! Game event logging with verbosity gating.
//!
//! Each session owns a [`GameLogger`] that decides, per event kind, whether
//! the current [`LogLevel`] lets the line through, formats it, and hands it
//! to a [`LogSink`]. The production sink forwards to `tracing`.

use crate::lock;
use crate::result::GameResult;
use crate::room::RoomState;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Which game events are logged. Each level includes the ones below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Logs nothing
    Silent,

    /// Logs only the result of each game
    #[default]
    Result,

    /// Also logs every switch change
    Changes,

    /// Also logs every prisoner entering the room
    All,

    /// Also logs the switch positions after each turn
    Debug,
}

impl LogLevel {
    /// Returns all levels, least verbose first.
    pub fn all() -> Vec<LogLevel> {
        vec![
            LogLevel::Silent,
            LogLevel::Result,
            LogLevel::Changes,
            LogLevel::All,
            LogLevel::Debug,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Silent => "silent",
            LogLevel::Result => "result",
            LogLevel::Changes => "changes",
            LogLevel::All => "all",
            LogLevel::Debug => "debug",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "none" | "off" => Ok(LogLevel::Silent),
            "result" | "results" => Ok(LogLevel::Result),
            "changes" | "change" => Ok(LogLevel::Changes),
            "all" | "info" => Ok(LogLevel::All),
            "debug" => Ok(LogLevel::Debug),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Destination of formatted game lines.
pub trait LogSink: Send + Sync {
    fn emit(&self, level: LogLevel, line: &str);
}

/// Sink that forwards game lines to `tracing`.
///
/// Debug snapshots go out at DEBUG, everything else at INFO, so the
/// subscriber's max level has to be raised for `LogLevel::Debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Silent => {}
            LogLevel::Debug => debug!(target: "switchroom::game", "{}", line),
            _ => info!(target: "switchroom::game", "{}", line),
        }
    }
}

/// Sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    /// Returns a copy of all lines emitted so far.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        lock(&self.lines).clone()
    }

    /// Number of lines emitted at exactly `level`.
    pub fn count(&self, level: LogLevel) -> usize {
        lock(&self.lines).iter().filter(|(l, _)| *l == level).count()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, level: LogLevel, line: &str) {
        lock(&self.lines).push((level, line.to_string()));
    }
}

/// Per-session logger.
#[derive(Clone)]
pub struct GameLogger {
    game: String,
    level: LogLevel,
    sink: Arc<dyn LogSink>,
}

impl GameLogger {
    pub fn new(game: impl Into<String>, level: LogLevel, sink: Arc<dyn LogSink>) -> Self {
        Self {
            game: game.into(),
            level,
            sink,
        }
    }

    /// Logger that forwards to `tracing`.
    pub fn tracing(game: impl Into<String>, level: LogLevel) -> Self {
        Self::new(game, level, Arc::new(TracingSink))
    }

    /// Logger that drops everything.
    pub fn silent(game: impl Into<String>) -> Self {
        Self::new(game, LogLevel::Silent, Arc::new(TracingSink))
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// True if lines of `level` pass the gate.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && self.level >= level
    }

    fn emit(&self, level: LogLevel, msg: &str) {
        self.sink.emit(level, &format!("[Game {}] {}", self.game, msg));
    }

    /// Logs the final line of a game.
    pub fn result(&self, result: &GameResult) {
        if !self.enabled(LogLevel::Result) {
            return;
        }
        let outcome = if result.success { "SUCCESS" } else { "FAIL" };
        self.emit(
            LogLevel::Result,
            &format!(
                "{} in {} steps with {}",
                outcome,
                result.steps,
                switches_phrase(result.used_switches)
            ),
        );
    }

    /// Logs a state change made by some actor.
    pub fn change(&self, name: &str, state: bool, operator: &str) {
        if self.enabled(LogLevel::Changes) {
            self.emit(LogLevel::Changes, &format!("{} set to {} by {}", name, state, operator));
        }
    }

    /// Logs a switch toggle made by a prisoner.
    pub fn switch_changed(&self, switch: &str, state: bool, prisoner: usize) {
        if self.enabled(LogLevel::Changes) {
            self.change(&format!("switch {}", switch), state, &format!("prisoner #{}", prisoner));
        }
    }

    /// Logs a free-form line at `All`.
    pub fn info(&self, msg: &str) {
        if self.enabled(LogLevel::All) {
            self.emit(LogLevel::All, msg);
        }
    }

    pub fn prisoner_entering(&self, prisoner: usize) {
        if self.enabled(LogLevel::All) {
            self.info(&format!("prisoner #{} is entering the room", prisoner));
        }
    }

    /// Logs a free-form line at `Debug`.
    pub fn debug(&self, msg: &str) {
        if self.enabled(LogLevel::Debug) {
            self.emit(LogLevel::Debug, msg);
        }
    }

    /// Logs the position of both switches.
    pub fn switch_snapshot(&self, room: &RoomState) {
        if self.enabled(LogLevel::Debug) {
            self.debug(&format!("switch A: {}", room.switch_a().state()));
            self.debug(&format!("switch B: {}", room.switch_b().state()));
        }
    }
}

impl std::fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLogger")
            .field("game", &self.game)
            .field("level", &self.level)
            .finish()
    }
}

fn switches_phrase(used: u64) -> String {
    match used {
        0 => "no switch".to_string(),
        1 => "a switch".to_string(),
        n => format!("{} switches", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger_at(level: LogLevel) -> (GameLogger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (GameLogger::new("#7", level, sink.clone()), sink)
    }

    fn emit_everything(logger: &GameLogger) {
        let result = GameResult {
            success: true,
            message: String::new(),
            steps: 12,
            used_switches: 1,
            score: 0,
        };
        logger.result(&result);
        logger.switch_changed("A", true, 2);
        logger.prisoner_entering(2);
        logger.switch_snapshot(&RoomState::new(true, false));
    }

    #[test]
    fn test_levels_are_cumulative() {
        let expected = [
            (LogLevel::Silent, 0),
            (LogLevel::Result, 1),
            (LogLevel::Changes, 2),
            (LogLevel::All, 3),
            (LogLevel::Debug, 5),
        ];

        for (level, lines) in expected {
            let (logger, sink) = logger_at(level);
            emit_everything(&logger);
            assert_eq!(sink.lines().len(), lines, "level {}", level);
        }
    }

    #[test]
    fn test_line_formats() {
        let (logger, sink) = logger_at(LogLevel::Debug);
        emit_everything(&logger);

        let lines: Vec<String> = sink.lines().into_iter().map(|(_, l)| l).collect();
        assert_eq!(
            lines,
            vec![
                "[Game #7] SUCCESS in 12 steps with a switch",
                "[Game #7] switch A set to true by prisoner #2",
                "[Game #7] prisoner #2 is entering the room",
                "[Game #7] switch A: true",
                "[Game #7] switch B: false",
            ]
        );
        assert_eq!(sink.count(LogLevel::Debug), 2);
    }

    #[test]
    fn test_free_form_lines_are_gated() {
        let (logger, sink) = logger_at(LogLevel::All);
        logger.info("barrier released");
        logger.debug("hidden");

        assert_eq!(
            sink.lines(),
            vec![(LogLevel::All, "[Game #7] barrier released".to_string())]
        );
    }

    #[test]
    fn test_result_line_phrases() {
        let (logger, sink) = logger_at(LogLevel::Result);
        for used in 0..=2 {
            logger.result(&GameResult {
                used_switches: used,
                steps: 3,
                ..Default::default()
            });
        }

        let lines: Vec<String> = sink.lines().into_iter().map(|(_, l)| l).collect();
        assert_eq!(lines[0], "[Game #7] FAIL in 3 steps with no switch");
        assert_eq!(lines[1], "[Game #7] FAIL in 3 steps with a switch");
        assert_eq!(lines[2], "[Game #7] FAIL in 3 steps with 2 switches");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("changes".parse::<LogLevel>(), Ok(LogLevel::Changes));
        assert_eq!("silent".parse::<LogLevel>(), Ok(LogLevel::Silent));
        assert!("verbose".parse::<LogLevel>().is_err());

        for level in LogLevel::all() {
            assert_eq!(level.name().parse::<LogLevel>(), Ok(level));
        }
    }
}
