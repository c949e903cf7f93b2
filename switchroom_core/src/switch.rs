//! Switch buttons: the plain state and its logging wrapper.

use crate::logger::GameLogger;
use rand::Rng;
use switchroom_env::SwitchButton;

/// One switch in the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchState {
    name: &'static str,
    state: bool,
    used: bool,
}

impl SwitchState {
    /// Creates an unused switch in the given position.
    pub fn new(name: &'static str, state: bool) -> Self {
        Self {
            name,
            state,
            used: false,
        }
    }

    /// Creates an unused switch with a uniformly random position.
    pub fn random<R: Rng + ?Sized>(name: &'static str, rng: &mut R) -> Self {
        Self::new(name, rng.gen_bool(0.5))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> bool {
        self.state
    }

    /// Flips the switch and returns the new position.
    pub fn toggle(&mut self) -> bool {
        self.state = !self.state;
        self.state
    }

    /// True once any prisoner has taken this switch.
    pub fn is_used(&self) -> bool {
        self.used
    }

    pub(crate) fn mark_used(&mut self) {
        self.used = true;
    }
}

impl SwitchButton for SwitchState {
    fn name(&self) -> &str {
        self.name
    }

    fn state(&self) -> bool {
        self.state
    }

    fn toggle(&mut self) -> bool {
        SwitchState::toggle(self)
    }
}

/// A switch handed to a prisoner during a turn.
///
/// Forwards reads to the underlying switch and reports every toggle to the
/// session logger together with the acting prisoner.
pub struct LoggedSwitch<'a> {
    switch: &'a mut SwitchState,
    logger: &'a GameLogger,
    prisoner: usize,
}

impl<'a> LoggedSwitch<'a> {
    pub fn new(switch: &'a mut SwitchState, logger: &'a GameLogger, prisoner: usize) -> Self {
        Self {
            switch,
            logger,
            prisoner,
        }
    }
}

impl SwitchButton for LoggedSwitch<'_> {
    fn name(&self) -> &str {
        self.switch.name()
    }

    fn state(&self) -> bool {
        self.switch.state()
    }

    fn toggle(&mut self) -> bool {
        let state = self.switch.toggle();
        self.logger.switch_changed(self.switch.name(), state, self.prisoner);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogLevel, MemorySink};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    #[test]
    fn test_toggle_flips_and_returns_new_state() {
        let mut switch = SwitchState::new("A", false);
        assert!(switch.toggle());
        assert!(switch.state());
        assert!(!switch.toggle());
        assert!(!switch.is_used());
    }

    #[test]
    fn test_random_initial_state_covers_both_positions() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let states: Vec<bool> = (0..64)
            .map(|_| SwitchState::random("A", &mut rng).state())
            .collect();

        assert!(states.iter().any(|s| *s));
        assert!(states.iter().any(|s| !*s));
    }

    #[test]
    fn test_logged_switch_reports_changes_only() {
        let sink = Arc::new(MemorySink::default());
        let logger = GameLogger::new("#1", LogLevel::Changes, sink.clone());
        let mut switch = SwitchState::new("B", true);

        {
            let mut logged = LoggedSwitch::new(&mut switch, &logger, 3);
            assert_eq!(logged.name(), "B");
            assert!(logged.state());
            assert!(!logged.toggle());
        }

        assert!(!switch.state());
        assert_eq!(
            sink.lines(),
            vec![(LogLevel::Changes, "[Game #1] switch B set to false by prisoner #3".to_string())]
        );
    }
}
