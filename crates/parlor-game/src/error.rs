//! Error types for the game layer.

use crate::Phase;

/// Errors returned by host-side game actions.
///
/// Inbound peer messages never produce these; a bad peer message is
/// rejected and logged instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// A round cannot start without players.
    #[error("no players to select a drawer from")]
    NoPlayers,

    /// The action is not legal from the current phase.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    /// Dealing needs two distinct secret characters.
    #[error("need at least 2 characters to deal, got {0}")]
    NotEnoughCharacters(usize),

    /// The action needs a game that has been dealt.
    #[error("no game in progress")]
    NotPlaying,
}
