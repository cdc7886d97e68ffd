//! The Guess-Who game-state store and message handling.

use std::collections::BTreeSet;
use std::fmt;

use parlor_protocol::{Inbound, PeerId, Recipient, TaggedMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Character, Deal, GuessWhoMessage};
use crate::{GameError, GameRules, Outcome};

/// Where a Guess-Who client is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GuessWhoPhase {
    #[default]
    Menu,
    /// In a room, waiting for the opponent or the deal.
    Waiting,
    Playing,
}

impl fmt::Display for GuessWhoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu => f.write_str("menu"),
            Self::Waiting => f.write_str("waiting"),
            Self::Playing => f.write_str("playing"),
        }
    }
}

/// One player's view of a Guess-Who game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessWhoState {
    characters: Vec<Character>,
    my_secret: Option<Character>,
    my_crossed_out: BTreeSet<u32>,
    opponent_crossed_out: BTreeSet<u32>,
    my_name: String,
    opponent_name: String,
    my_wins: u32,
    opponent_wins: u32,
    phase: GuessWhoPhase,
}

impl Default for GuessWhoState {
    fn default() -> Self {
        Self {
            characters: Vec::new(),
            my_secret: None,
            my_crossed_out: BTreeSet::new(),
            opponent_crossed_out: BTreeSet::new(),
            my_name: "You".to_string(),
            opponent_name: "Opponent".to_string(),
            my_wins: 0,
            opponent_wins: 0,
            phase: GuessWhoPhase::Menu,
        }
    }
}

impl GuessWhoState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn my_secret(&self) -> Option<&Character> {
        self.my_secret.as_ref()
    }

    pub fn my_crossed_out(&self) -> &BTreeSet<u32> {
        &self.my_crossed_out
    }

    pub fn opponent_crossed_out(&self) -> &BTreeSet<u32> {
        &self.opponent_crossed_out
    }

    pub fn my_name(&self) -> &str {
        &self.my_name
    }

    pub fn opponent_name(&self) -> &str {
        &self.opponent_name
    }

    pub fn my_wins(&self) -> u32 {
        self.my_wins
    }

    pub fn opponent_wins(&self) -> u32 {
        self.opponent_wins
    }

    pub fn phase(&self) -> GuessWhoPhase {
        self.phase
    }

    /// Entered a room; waiting for the opponent or the deal.
    pub fn enter_waiting(&mut self) {
        self.phase = GuessWhoPhase::Waiting;
    }

    /// Starts a game with this board and secret. Both crossed-out sets
    /// are cleared; names and win counts carry over.
    pub fn begin(&mut self, characters: Vec<Character>, secret: Character) {
        self.characters = characters;
        self.my_secret = Some(secret);
        self.my_crossed_out.clear();
        self.opponent_crossed_out.clear();
        self.phase = GuessWhoPhase::Playing;
    }

    /// Host side of a deal: takes the host's half, returns the
    /// `gameStart` for the guest.
    pub fn begin_as_host(&mut self, deal: Deal) -> GuessWhoMessage {
        self.begin(deal.host_board, deal.host_secret);
        GuessWhoMessage::GameStart {
            characters: deal.guest_board,
            secret: deal.guest_secret,
        }
    }

    /// Crosses a character out, or back in, on the local board.
    ///
    /// Returns the `crossOut` sync message with the full new set.
    pub fn toggle_cross_out(&mut self, id: u32) -> Result<GuessWhoMessage, GameError> {
        if self.phase != GuessWhoPhase::Playing {
            return Err(GameError::NotPlaying);
        }
        if !self.characters.iter().any(|c| c.id == id) {
            debug!(id, "cross-out of character not on board");
            return Ok(self.cross_out_message());
        }
        if !self.my_crossed_out.remove(&id) {
            self.my_crossed_out.insert(id);
        }
        Ok(self.cross_out_message())
    }

    fn cross_out_message(&self) -> GuessWhoMessage {
        GuessWhoMessage::CrossOut {
            crossed_out: self.my_crossed_out.iter().copied().collect(),
        }
    }

    /// Renames the local player. Returns `None` for a blank name.
    pub fn set_my_name(&mut self, name: &str) -> Option<GuessWhoMessage> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.my_name = name.to_string();
        Some(GuessWhoMessage::NameUpdate {
            name: self.my_name.clone(),
        })
    }

    /// Win counters are local bookkeeping and are never sent.
    pub fn add_win_to_me(&mut self) {
        self.my_wins += 1;
    }

    pub fn add_win_to_opponent(&mut self) {
        self.opponent_wins += 1;
    }

    /// Back to an empty menu state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Marker type carrying the Guess-Who [`GameRules`].
pub struct GuessWho;

impl GameRules for GuessWho {
    type State = GuessWhoState;
    type Message = GuessWhoMessage;

    fn apply(state: &mut GuessWhoState, msg: &GuessWhoMessage) {
        match msg {
            GuessWhoMessage::GameStart { characters, secret } => {
                state.begin(characters.clone(), secret.clone());
            }
            GuessWhoMessage::CrossOut { crossed_out } => {
                state.opponent_crossed_out = crossed_out.iter().copied().collect();
            }
            // Only triggers a deal; see `host_dispatch`.
            GuessWhoMessage::Ready => {}
            GuessWhoMessage::NameUpdate { name } => {
                state.opponent_name = name.clone();
            }
        }
    }

    fn validate(
        _state: &GuessWhoState,
        _sender: &PeerId,
        msg: &GuessWhoMessage,
    ) -> Result<(), String> {
        match msg {
            GuessWhoMessage::GameStart { .. } => Err("only the host deals".to_string()),
            _ => Ok(()),
        }
    }
}

/// Something the Guess-Who client loop must do after a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send(Recipient, GuessWhoMessage),
    /// Fetch characters and deal a new game.
    Deal,
}

/// Host handling of a guest message.
pub fn host_dispatch(
    state: &mut GuessWhoState,
    sender: &PeerId,
    inbound: &Inbound<GuessWhoMessage>,
) -> Outcome<Effect> {
    let Inbound::Known(msg) = inbound else {
        GuessWho::dispatch(state, inbound);
        return Outcome::unrecognized();
    };
    if let Err(reason) = GuessWho::validate(state, sender, msg) {
        warn!(%sender, kind = msg.type_name(), %reason, "rejected peer message");
        return Outcome::handled(Vec::new());
    }

    GuessWho::apply(state, msg);
    let effects = match msg {
        GuessWhoMessage::Ready => {
            info!(%sender, "guest ready, dealing");
            vec![Effect::Deal]
        }
        _ => Vec::new(),
    };
    Outcome::handled(effects)
}

/// Guest handling of a host message.
pub fn guest_dispatch(
    state: &mut GuessWhoState,
    inbound: &Inbound<GuessWhoMessage>,
) -> Outcome<Effect> {
    if GuessWho::dispatch(state, inbound) {
        Outcome::handled(Vec::new())
    } else {
        Outcome::unrecognized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guess_who::deal;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn board() -> Vec<Character> {
        (0..4)
            .map(|id| Character {
                id,
                name: format!("c{id}"),
                image: String::new(),
            })
            .collect()
    }

    fn playing() -> GuessWhoState {
        let mut state = GuessWhoState::new();
        let chars = board();
        let secret = chars[0].clone();
        state.begin(chars, secret);
        state
    }

    #[test]
    fn test_toggle_cross_out_round_trip_sends_full_set() {
        let mut state = playing();

        state.toggle_cross_out(2).unwrap();
        let msg = state.toggle_cross_out(1).unwrap();
        assert_eq!(msg, GuessWhoMessage::CrossOut { crossed_out: vec![1, 2] });

        let msg = state.toggle_cross_out(2).unwrap();
        assert_eq!(msg, GuessWhoMessage::CrossOut { crossed_out: vec![1] });
    }

    #[test]
    fn test_toggle_cross_out_requires_game() {
        let mut state = GuessWhoState::new();
        assert_eq!(state.toggle_cross_out(0), Err(GameError::NotPlaying));
    }

    #[test]
    fn test_toggle_cross_out_ignores_unknown_id() {
        let mut state = playing();
        state.toggle_cross_out(99).unwrap();
        assert!(state.my_crossed_out().is_empty());
    }

    #[test]
    fn test_apply_cross_out_sets_opponent_set_only() {
        let mut state = playing();
        state.toggle_cross_out(3).unwrap();

        GuessWho::apply(&mut state, &GuessWhoMessage::CrossOut { crossed_out: vec![0, 1] });

        assert_eq!(state.opponent_crossed_out(), &BTreeSet::from([0, 1]));
        assert_eq!(state.my_crossed_out(), &BTreeSet::from([3]));
    }

    #[test]
    fn test_apply_game_start_clears_both_sets_and_keeps_wins() {
        let mut state = playing();
        state.toggle_cross_out(1).unwrap();
        GuessWho::apply(&mut state, &GuessWhoMessage::CrossOut { crossed_out: vec![2] });
        state.add_win_to_me();

        let chars = board();
        GuessWho::apply(
            &mut state,
            &GuessWhoMessage::GameStart {
                secret: chars[3].clone(),
                characters: chars,
            },
        );

        assert_eq!(state.phase(), GuessWhoPhase::Playing);
        assert!(state.my_crossed_out().is_empty());
        assert!(state.opponent_crossed_out().is_empty());
        assert_eq!(state.my_secret().map(|c| c.id), Some(3));
        assert_eq!(state.my_wins(), 1);
    }

    #[test]
    fn test_apply_name_update_renames_opponent() {
        let mut state = GuessWhoState::new();
        GuessWho::apply(&mut state, &GuessWhoMessage::NameUpdate { name: "Ada".into() });
        assert_eq!(state.opponent_name(), "Ada");
        assert_eq!(state.my_name(), "You");
    }

    #[test]
    fn test_begin_as_host_keeps_host_half() {
        let mut rng = StdRng::seed_from_u64(3);
        let d = deal(&board(), &mut rng).unwrap();
        let host_secret = d.host_secret.clone();
        let guest_secret = d.guest_secret.clone();

        let mut state = GuessWhoState::new();
        let msg = state.begin_as_host(d);

        assert_eq!(state.my_secret(), Some(&host_secret));
        let GuessWhoMessage::GameStart { secret, characters } = msg else {
            panic!("expected gameStart");
        };
        assert_eq!(secret, guest_secret);
        assert_eq!(characters.len(), 4);
    }

    #[test]
    fn test_host_dispatch_ready_requests_deal() {
        let mut state = GuessWhoState::new();
        let outcome = host_dispatch(
            &mut state,
            &PeerId::new("guest"),
            &Inbound::Known(GuessWhoMessage::Ready),
        );
        assert!(outcome.recognized);
        assert_eq!(outcome.effects, vec![Effect::Deal]);
    }

    #[test]
    fn test_host_dispatch_rejects_game_start_from_guest() {
        let mut state = playing();
        let before = state.clone();
        let chars = board();
        let outcome = host_dispatch(
            &mut state,
            &PeerId::new("guest"),
            &Inbound::Known(GuessWhoMessage::GameStart {
                secret: chars[1].clone(),
                characters: chars,
            }),
        );
        assert!(outcome.recognized);
        assert_eq!(state, before);
    }

    #[test]
    fn test_guest_dispatch_unrecognized() {
        let mut state = GuessWhoState::new();
        let outcome = guest_dispatch(&mut state, &Inbound::Unrecognized("emote".into()));
        assert!(!outcome.recognized);
    }

    #[test]
    fn test_reset_clears_names_and_wins() {
        let mut state = playing();
        state.set_my_name("Ada");
        state.add_win_to_opponent();
        state.reset();
        assert_eq!(state, GuessWhoState::default());
    }
}
