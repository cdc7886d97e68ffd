//! Game configuration and the Pictionary phase machine.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PictionaryConfig
// ---------------------------------------------------------------------------

/// Tunables for a Pictionary room. Only the host's values matter: round
/// length travels to guests inside `startRound`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictionaryConfig {
    /// Length of one drawing round.
    pub round_duration_secs: u32,

    /// How long the round result stays on screen before the scoreboard.
    pub scoreboard_delay: Duration,

    /// Points for the player who guessed the word.
    pub guesser_points: u32,

    /// Points for the drawer when their word is guessed.
    pub drawer_points: u32,

    /// Display name the host gives itself.
    pub host_name: String,
}

impl Default for PictionaryConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: 120,
            scoreboard_delay: Duration::from_secs(3),
            guesser_points: 10,
            drawer_points: 5,
            host_name: "Host".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// GuessWhoConfig
// ---------------------------------------------------------------------------

/// Tunables for a Guess-Who room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessWhoConfig {
    /// Characters on each board.
    pub board_size: usize,
}

impl Default for GuessWhoConfig {
    fn default() -> Self {
        Self { board_size: 24 }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a Pictionary client is in the game.
///
/// ```text
/// Menu → Lobby → Drawing → RoundEnd → Scoreboard ─┬→ Lobby (continue)
///                                                 └→ Menu  (finish)
/// ```
///
/// Any phase may also drop straight back to `Menu` on reset or
/// disconnect; that path bypasses [`Phase::can_transition_to`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Menu,
    Lobby,
    Drawing,
    RoundEnd,
    Scoreboard,
}

impl Phase {
    /// Returns `true` if the regular flow allows moving to `target`.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Menu, Self::Lobby)
                | (Self::Lobby, Self::Drawing)
                | (Self::Drawing, Self::RoundEnd)
                | (Self::RoundEnd, Self::Scoreboard)
                | (Self::Scoreboard, Self::Lobby)
                | (Self::Scoreboard, Self::Menu)
        )
    }

    /// Returns `true` once a player is inside a room.
    pub fn in_room(self) -> bool {
        !matches!(self, Self::Menu)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Menu => "menu",
            Self::Lobby => "lobby",
            Self::Drawing => "drawing",
            Self::RoundEnd => "roundEnd",
            Self::Scoreboard => "scoreboard",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_can_transition_follows_round_cycle() {
        assert!(Phase::Menu.can_transition_to(Phase::Lobby));
        assert!(Phase::Lobby.can_transition_to(Phase::Drawing));
        assert!(Phase::Drawing.can_transition_to(Phase::RoundEnd));
        assert!(Phase::RoundEnd.can_transition_to(Phase::Scoreboard));
        assert!(Phase::Scoreboard.can_transition_to(Phase::Lobby));
        assert!(Phase::Scoreboard.can_transition_to(Phase::Menu));
    }

    #[test]
    fn test_phase_can_transition_rejects_skips() {
        assert!(!Phase::Lobby.can_transition_to(Phase::RoundEnd));
        assert!(!Phase::Drawing.can_transition_to(Phase::Scoreboard));
        assert!(!Phase::RoundEnd.can_transition_to(Phase::Lobby));
        assert!(!Phase::Drawing.can_transition_to(Phase::Drawing));
    }

    #[test]
    fn test_phase_serializes_camel_case() {
        let json = serde_json::to_string(&Phase::RoundEnd).unwrap();
        assert_eq!(json, "\"roundEnd\"");
        assert_eq!(Phase::RoundEnd.to_string(), "roundEnd");
    }

    #[test]
    fn test_pictionary_config_default() {
        let config = PictionaryConfig::default();
        assert_eq!(config.round_duration_secs, 120);
        assert_eq!(config.scoreboard_delay, Duration::from_secs(3));
        assert_eq!(config.guesser_points, 10);
        assert_eq!(config.drawer_points, 5);
        assert_eq!(config.host_name, "Host");
    }

    #[test]
    fn test_guess_who_config_default() {
        assert_eq!(GuessWhoConfig::default().board_size, 24);
    }
}
