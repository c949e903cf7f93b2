//! The room and the per-turn private copy handed to a prisoner.

use crate::logger::GameLogger;
use crate::switch::{LoggedSwitch, SwitchState};
use rand::Rng;
use switchroom_env::{Room, SwitchButton};

/// Authoritative room state of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomState {
    switch_a: SwitchState,
    switch_b: SwitchState,
}

impl RoomState {
    /// Creates a room with both switches in the given positions.
    pub fn new(a: bool, b: bool) -> Self {
        Self {
            switch_a: SwitchState::new("A", a),
            switch_b: SwitchState::new("B", b),
        }
    }

    /// Creates a room with independently random switch positions.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            switch_a: SwitchState::random("A", rng),
            switch_b: SwitchState::random("B", rng),
        }
    }

    pub fn switch_a(&self) -> &SwitchState {
        &self.switch_a
    }

    pub fn switch_b(&self) -> &SwitchState {
        &self.switch_b
    }

    /// Number of distinct switches ever taken (0, 1 or 2).
    pub fn used_switches(&self) -> u64 {
        self.switch_a.is_used() as u64 + self.switch_b.is_used() as u64
    }

    /// Copies the room for one prisoner's turn.
    ///
    /// The copy is the only thing the prisoner can touch; the caller commits
    /// it back with [`TurnRoom::into_state`] once `enter` returns.
    pub fn prepare_entering_by<'a>(&self, prisoner: usize, logger: &'a GameLogger) -> TurnRoom<'a> {
        TurnRoom {
            room: self.clone(),
            logger,
            prisoner,
        }
    }
}

/// Private room copy for a single turn.
pub struct TurnRoom<'a> {
    room: RoomState,
    logger: &'a GameLogger,
    prisoner: usize,
}

impl TurnRoom<'_> {
    /// Prisoner currently in the room.
    pub fn prisoner(&self) -> usize {
        self.prisoner
    }

    /// Finishes the turn, yielding the mutated room.
    pub fn into_state(self) -> RoomState {
        self.room
    }
}

impl Room for TurnRoom<'_> {
    fn take_switch_a(&mut self) -> Box<dyn SwitchButton + '_> {
        self.room.switch_a.mark_used();
        Box::new(LoggedSwitch::new(&mut self.room.switch_a, self.logger, self.prisoner))
    }

    fn take_switch_b(&mut self) -> Box<dyn SwitchButton + '_> {
        self.room.switch_b.mark_used();
        Box::new(LoggedSwitch::new(&mut self.room.switch_b, self.logger, self.prisoner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{GameLogger, LogLevel};

    #[test]
    fn test_taking_marks_used_without_toggle() {
        let logger = GameLogger::silent("#1");
        let room = RoomState::new(false, false);
        assert_eq!(room.used_switches(), 0);

        let mut turn = room.prepare_entering_by(0, &logger);
        let _ = turn.take_switch_a().state();
        let room = turn.into_state();
        assert_eq!(room.used_switches(), 1);
        assert!(!room.switch_a().state());

        let mut turn = room.prepare_entering_by(1, &logger);
        let _ = turn.take_switch_a().state();
        let _ = turn.take_switch_b().state();
        assert_eq!(turn.into_state().used_switches(), 2);
    }

    #[test]
    fn test_turn_copy_does_not_alias_original() {
        let logger = GameLogger::silent("#1");
        let original = RoomState::new(true, false);

        let mut turn = original.prepare_entering_by(4, &logger);
        assert_eq!(turn.prisoner(), 4);
        turn.take_switch_a().toggle();
        turn.take_switch_b().toggle();

        // Untouched until committed
        assert!(original.switch_a().state());
        assert!(!original.switch_b().state());
        assert_eq!(original.used_switches(), 0);

        let committed = turn.into_state();
        assert!(!committed.switch_a().state());
        assert!(committed.switch_b().state());
    }

    #[test]
    fn test_used_count_never_decreases_across_turns() {
        let logger = GameLogger::new("#1", LogLevel::Silent, std::sync::Arc::new(crate::MemorySink::default()));
        let mut room = RoomState::new(false, true);
        let mut last = 0;

        for prisoner in 0..6 {
            let mut turn = room.prepare_entering_by(prisoner, &logger);
            if prisoner == 2 {
                turn.take_switch_b().toggle();
            }
            if prisoner == 4 {
                let _ = turn.take_switch_a().state();
            }
            room = turn.into_state();
            assert!(room.used_switches() >= last);
            assert!(room.used_switches() <= 2);
            last = room.used_switches();
        }
        assert_eq!(last, 2);
    }
}
