//! Game results, scoring and aggregation.

use serde::{Deserialize, Serialize};

/// Scoring horizon: a game solved in this many steps or more scores nothing.
pub const MAX_STEPS: u64 = 100_000;

pub const MSG_PASSED: &str = "All games passed";
pub const MSG_FAILED: &str = "Some game failed";
pub const MSG_TIMED_OUT: &str = "Timed out";

/// Result of one game, or of a whole batch after merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub success: bool,
    pub message: String,
    pub steps: u64,
    pub used_switches: u64,
    pub score: u64,
}

impl GameResult {
    /// Creates an empty result carrying only the verdict.
    pub fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Computes `score` from the other fields.
    ///
    /// Failed games score 0. Successful games score `MAX_STEPS - steps`
    /// (floored at 0), plus a `MAX_STEPS` bonus when at most one switch was
    /// used and the base score is positive.
    pub fn calc_score(mut self) -> Self {
        if !self.success {
            self.score = 0;
            return self;
        }

        self.score = MAX_STEPS.saturating_sub(self.steps);

        // a bonus for using only one switch
        if self.score > 0 && self.used_switches <= 1 {
            self.score += MAX_STEPS;
        }

        self
    }

    /// Merges another result into this one.
    ///
    /// Steps and scores add up and the switch count takes the maximum. A
    /// failed `other` fails the whole merge and takes over its message. A
    /// failed result never carries a score, so one failure anywhere in a
    /// chain zeroes the batch.
    pub fn merge(&mut self, other: &GameResult) -> &mut Self {
        self.steps += other.steps;
        self.used_switches = self.used_switches.max(other.used_switches);
        self.score += other.score;

        if !other.success {
            self.success = false;
            self.message = other.message.clone();
        }
        if !self.success {
            self.score = 0;
        }

        if self.message.is_empty() {
            self.message = other.message.clone();
        }

        self
    }

    /// Folds every result of `results` into `self`.
    pub fn merge_all<'a, I>(mut self, results: I) -> Self
    where
        I: IntoIterator<Item = &'a GameResult>,
    {
        for result in results {
            self.merge(result);
        }
        self
    }

    /// Encodes the result as a single-line JSON object.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
