//! Entry scheduling policies and the verdicts they hand down.

use crate::session::SessionOutcome;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How prisoners are picked to enter the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryPolicy {
    /// Uniform random pick with replacement among all prisoners.
    ///
    /// A correct strategy eventually wins.
    Fair,

    /// Like `Fair`, but one randomly chosen prisoner never enters.
    ///
    /// Nobody can ever know that everyone has been in, so any shout is a
    /// false positive.
    Mortal,
}

impl EntryPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            EntryPolicy::Fair => "fair",
            EntryPolicy::Mortal => "mortal",
        }
    }

    /// Smallest prisoner count the policy can schedule.
    pub fn min_prisoners(&self) -> usize {
        match self {
            EntryPolicy::Fair => 1,
            EntryPolicy::Mortal => 2,
        }
    }

    /// Chooses the prisoner that will never be scheduled, if any.
    pub fn pick_excluded<R: Rng + ?Sized>(&self, rng: &mut R, prisoners: usize) -> Option<usize> {
        match self {
            EntryPolicy::Fair => None,
            EntryPolicy::Mortal => Some(rng.gen_range(0..prisoners)),
        }
    }

    /// Turns a session outcome into pass/fail.
    pub fn judge(&self, outcome: SessionOutcome) -> Verdict {
        match (self, outcome) {
            (EntryPolicy::Fair, SessionOutcome::Triumph { verified: true }) => Verdict::Passed,
            (EntryPolicy::Fair, SessionOutcome::Triumph { verified: false }) => {
                Verdict::Failed(FailureKind::PrematureTriumph)
            }
            (EntryPolicy::Fair, SessionOutcome::Halted) => Verdict::Failed(FailureKind::Halted),
            (EntryPolicy::Mortal, SessionOutcome::Triumph { .. }) => {
                Verdict::Failed(FailureKind::FalseTriumph)
            }
            (EntryPolicy::Mortal, SessionOutcome::Halted) => Verdict::Passed,
        }
    }
}

impl std::fmt::Display for EntryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why a session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Fair game: triumph shouted before every prisoner had entered
    PrematureTriumph,

    /// Mortal game: triumph shouted at all
    FalseTriumph,

    /// Fair game: stopped or out of steps without a shout
    Halted,

    /// Session could not be set up (barrier or configuration error)
    SetupFailed,

    /// Session's watcher went away without reporting
    Abandoned,

    /// Batch deadline expired before the session finished
    TimedOut,
}

impl FailureKind {
    pub fn description(&self) -> &'static str {
        match self {
            FailureKind::PrematureTriumph => "triumph shouted before every prisoner entered",
            FailureKind::FalseTriumph => "triumph shouted in a game that cannot be won",
            FailureKind::Halted => "stopped without a shout",
            FailureKind::SetupFailed => "session setup failed",
            FailureKind::Abandoned => "session abandoned without a result",
            FailureKind::TimedOut => "timed out",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Pass/fail decision for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Passed,
    Failed(FailureKind),
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            Verdict::Passed => None,
            Verdict::Failed(kind) => Some(*kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_fair_judgement() {
        let fair = EntryPolicy::Fair;
        assert_eq!(fair.judge(SessionOutcome::Triumph { verified: true }), Verdict::Passed);
        assert_eq!(
            fair.judge(SessionOutcome::Triumph { verified: false }),
            Verdict::Failed(FailureKind::PrematureTriumph)
        );
        assert_eq!(fair.judge(SessionOutcome::Halted), Verdict::Failed(FailureKind::Halted));
    }

    #[test]
    fn test_mortal_judgement_rejects_every_shout() {
        let mortal = EntryPolicy::Mortal;
        assert_eq!(
            mortal.judge(SessionOutcome::Triumph { verified: true }),
            Verdict::Failed(FailureKind::FalseTriumph)
        );
        assert_eq!(
            mortal.judge(SessionOutcome::Triumph { verified: false }),
            Verdict::Failed(FailureKind::FalseTriumph)
        );
        assert!(mortal.judge(SessionOutcome::Halted).is_passed());
    }

    #[test]
    fn test_excluded_pick_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(EntryPolicy::Fair.pick_excluded(&mut rng, 10), None);
        for _ in 0..100 {
            let excluded = EntryPolicy::Mortal.pick_excluded(&mut rng, 3).unwrap();
            assert!(excluded < 3);
        }
    }
}
