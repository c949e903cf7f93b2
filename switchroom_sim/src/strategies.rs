//! Reference strategies for demos and tests.

use std::sync::Arc;
use switchroom_env::{Prisoner, Room, Shouter, Strategy};
use tracing::debug;

/// Strategy identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyId {
    /// Single-switch counting, the textbook solution
    Counting,

    /// Prisoner 0 claims triumph on its first visit
    Hasty,

    /// Nobody ever claims triumph
    Silent,
}

impl StrategyId {
    /// Returns a list of all strategies.
    pub fn all() -> Vec<StrategyId> {
        vec![StrategyId::Counting, StrategyId::Hasty, StrategyId::Silent]
    }

    /// Returns the strategy name.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyId::Counting => "counting",
            StrategyId::Hasty => "hasty",
            StrategyId::Silent => "silent",
        }
    }

    /// Returns a description of the strategy.
    pub fn description(&self) -> &'static str {
        match self {
            StrategyId::Counting => "Prisoner 0 counts signals on switch A; passes every game",
            StrategyId::Hasty => "Prisoner 0 shouts on its first visit; fails almost every game",
            StrategyId::Silent => "Nobody shouts; fair games never finish",
        }
    }

    /// Builds the strategy for games with `prisoners` prisoners.
    pub fn build(&self, prisoners: usize) -> Arc<dyn Strategy> {
        match self {
            StrategyId::Counting => Arc::new(CountingStrategy::new(prisoners)),
            StrategyId::Hasty => Arc::new(HastyStrategy::prisoner(0)),
            StrategyId::Silent => Arc::new(SilentStrategy),
        }
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for StrategyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "counting" | "counter" | "count" => Ok(StrategyId::Counting),
            "hasty" | "eager" => Ok(StrategyId::Hasty),
            "silent" | "mute" => Ok(StrategyId::Silent),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

/// The single-switch counting solution.
///
/// Prisoner 0 is the counter; only switch A is ever taken, so a passing game
/// earns the one-switch bonus. Every other prisoner turns A on exactly twice,
/// each time finding it off. The counter turns A off whenever it finds it on
/// and shouts after `2 * (N - 1)` such finds. Since the initial position of A
/// is unknown, one find may be spurious; two signals per prisoner make the
/// count conclusive anyway.
///
/// In a game where one prisoner never enters the threshold is unreachable,
/// so the strategy also stays silent in mortal games.
#[derive(Debug, Clone, Copy)]
pub struct CountingStrategy {
    prisoners: usize,
}

impl CountingStrategy {
    /// Counter that prisoner 0 plays.
    pub const COUNTER: usize = 0;

    pub fn new(prisoners: usize) -> Self {
        Self { prisoners }
    }

    /// Number of finds the counter needs before shouting.
    pub fn threshold(&self) -> u64 {
        2 * self.prisoners.saturating_sub(1) as u64
    }
}

impl Strategy for CountingStrategy {
    fn new_prisoner(&self, number: usize, shout: Shouter) -> Box<dyn Prisoner> {
        let role = if number == Self::COUNTER {
            Role::Counter { count: 0, threshold: self.threshold() }
        } else {
            Role::Signaller { signals_left: 2 }
        };
        Box::new(CountingPrisoner { number, role, shout, shouted: false })
    }
}

#[derive(Debug)]
enum Role {
    Counter { count: u64, threshold: u64 },
    Signaller { signals_left: u8 },
}

struct CountingPrisoner {
    number: usize,
    role: Role,
    shout: Shouter,
    shouted: bool,
}

impl Prisoner for CountingPrisoner {
    fn enter(&mut self, room: &mut dyn Room) {
        let mut switch = room.take_switch_a();
        match &mut self.role {
            Role::Counter { count, threshold } => {
                if switch.state() {
                    switch.toggle();
                    *count += 1;
                }
                if !self.shouted && *count >= *threshold {
                    self.shouted = true;
                    if let Err(e) = self.shout.shout() {
                        debug!(prisoner = self.number, error = %e, "Counter shout ignored");
                    }
                }
            }
            Role::Signaller { signals_left } => {
                if *signals_left > 0 && !switch.state() {
                    switch.toggle();
                    *signals_left -= 1;
                }
            }
        }
    }
}

/// Claims triumph without looking at the room.
#[derive(Debug, Clone, Copy)]
pub struct HastyStrategy {
    /// Prisoner that shouts; `None` means every prisoner does.
    shouter: Option<usize>,
}

impl HastyStrategy {
    /// Only prisoner `number` shouts.
    pub fn prisoner(number: usize) -> Self {
        Self { shouter: Some(number) }
    }

    /// Every prisoner shouts, so the first turn of a game ends it.
    pub fn everyone() -> Self {
        Self { shouter: None }
    }
}

impl Strategy for HastyStrategy {
    fn new_prisoner(&self, number: usize, shout: Shouter) -> Box<dyn Prisoner> {
        let eager = self.shouter.map_or(true, |n| n == number);
        Box::new(HastyPrisoner { eager, shout })
    }
}

struct HastyPrisoner {
    eager: bool,
    shout: Shouter,
}

impl Prisoner for HastyPrisoner {
    fn enter(&mut self, _room: &mut dyn Room) {
        if self.eager {
            // Repeats are rejected by the shouter and only counted.
            let _ = self.shout.shout();
        }
    }
}

/// Never touches anything, never shouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentStrategy;

impl Strategy for SilentStrategy {
    fn new_prisoner(&self, _number: usize, _shout: Shouter) -> Box<dyn Prisoner> {
        Box::new(SilentPrisoner)
    }
}

struct SilentPrisoner;

impl Prisoner for SilentPrisoner {
    fn enter(&mut self, _room: &mut dyn Room) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchroom_core::{GameLogger, RoomState};
    use switchroom_env::shout_channel;

    fn visit(room: RoomState, number: usize, prisoner: &mut dyn Prisoner) -> RoomState {
        let logger = GameLogger::silent("#test");
        let mut turn = room.prepare_entering_by(number, &logger);
        prisoner.enter(&mut turn);
        turn.into_state()
    }

    #[test]
    fn test_strategy_id_parsing() {
        for id in StrategyId::all() {
            assert_eq!(id.name().parse::<StrategyId>(), Ok(id));
            assert_eq!(id.to_string(), id.name());
        }
        assert_eq!("COUNTER".parse::<StrategyId>(), Ok(StrategyId::Counting));
        assert!("nope".parse::<StrategyId>().is_err());
    }

    #[test]
    fn test_counter_shouts_after_every_signal() {
        let strategy = CountingStrategy::new(3);
        assert_eq!(strategy.threshold(), 4);

        let (shouter, receiver) = shout_channel();
        let probe = receiver.probe();
        let mut prisoners: Vec<_> = (0..3)
            .map(|n| strategy.new_prisoner(n, shouter.clone()))
            .collect();

        let mut room = RoomState::new(false, false);
        // Each signaller sets A twice; the counter collects after each one.
        for signaller in [1, 2, 1, 2] {
            room = visit(room, signaller, prisoners[signaller].as_mut());
            assert!(room.switch_a().state());
            assert!(!probe.is_raised());
            room = visit(room, 0, prisoners[0].as_mut());
            assert!(!room.switch_a().state());
        }

        assert!(probe.is_raised());
        assert_eq!(probe.extra_shouts(), 0);
        assert_eq!(room.used_switches(), 1);
        assert!(!room.switch_b().is_used());
    }

    #[test]
    fn test_counter_tolerates_switch_initially_on() {
        let strategy = CountingStrategy::new(3);
        let (shouter, receiver) = shout_channel();
        let probe = receiver.probe();
        let mut counter = strategy.new_prisoner(0, shouter.clone());
        let mut first = strategy.new_prisoner(1, shouter.clone());

        // Spurious find plus both signals of prisoner 1: prisoner 2 never came.
        let mut room = RoomState::new(true, false);
        room = visit(room, 0, counter.as_mut());
        for _ in 0..2 {
            room = visit(room, 1, first.as_mut());
            room = visit(room, 0, counter.as_mut());
        }
        // Prisoner 1 is out of signals.
        room = visit(room, 1, first.as_mut());
        assert!(!room.switch_a().state());
        assert!(!probe.is_raised());
    }

    #[test]
    fn test_single_prisoner_counter_shouts_at_once() {
        let strategy = CountingStrategy::new(1);
        let (shouter, receiver) = shout_channel();
        let mut counter = strategy.new_prisoner(0, shouter);
        visit(RoomState::new(false, false), 0, counter.as_mut());
        assert!(receiver.probe().is_raised());
    }

    #[test]
    fn test_hasty_and_silent() {
        let (shouter, receiver) = shout_channel();
        let probe = receiver.probe();
        let hasty = HastyStrategy::prisoner(0);

        let mut other = hasty.new_prisoner(1, shouter.clone());
        visit(RoomState::new(false, false), 1, other.as_mut());
        assert!(!probe.is_raised());

        let mut silent = SilentStrategy.new_prisoner(0, shouter.clone());
        let room = visit(RoomState::new(false, false), 0, silent.as_mut());
        assert!(!probe.is_raised());
        assert_eq!(room.used_switches(), 0);

        let mut eager = hasty.new_prisoner(0, shouter);
        visit(RoomState::new(false, false), 0, eager.as_mut());
        visit(RoomState::new(false, false), 0, eager.as_mut());
        assert!(probe.is_raised());
        assert_eq!(probe.extra_shouts(), 1);
    }
}
