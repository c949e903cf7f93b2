//! The rules of the game as seen from a strategy.

use crate::shout::Shouter;

/// Total number of prisoners in a standard game.
pub const TOTAL_PRISONERS: usize = 100;

/// What a prisoner can do with one switch in the room.
pub trait SwitchButton {
    /// Returns the switch label ("A" or "B").
    fn name(&self) -> &str;

    /// Returns the current position of the switch.
    fn state(&self) -> bool;

    /// Flips the switch and returns its new position.
    fn toggle(&mut self) -> bool;
}

/// What is in the room.
///
/// Taking a switch counts as using it, whether or not it is toggled.
pub trait Room {
    fn take_switch_a(&mut self) -> Box<dyn SwitchButton + '_>;
    fn take_switch_b(&mut self) -> Box<dyn SwitchButton + '_>;
}

/// A single prisoner's decision logic.
///
/// `enter` runs synchronously against a private copy of the room. It must not
/// block; the only way to talk to the warden is the [`Shouter`] handed out at
/// creation.
pub trait Prisoner: Send {
    fn enter(&mut self, room: &mut dyn Room);
}

/// How prisoners behave.
pub trait Strategy: Send + Sync + 'static {
    /// Creates a new prisoner, distinguished from the others by `number`.
    ///
    /// This is called many times with the same number, once per game. The
    /// order of calls is shuffled across concurrently running games and
    /// carries no information about which game a prisoner belongs to.
    fn new_prisoner(&self, number: usize, shout: Shouter) -> Box<dyn Prisoner>;
}
