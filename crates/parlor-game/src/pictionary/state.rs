//! The Pictionary game-state store.
//!
//! Every operation is total: an unknown player id is a no-op, and no
//! sequence of calls leaves the store inconsistent.

use std::collections::BTreeMap;

use parlor_protocol::PeerId;
use serde::Serialize;

use super::{DrawingEvent, Player};
use crate::Phase;

/// One client's view of a Pictionary room.
///
/// Created empty in [`Phase::Menu`]. On the host this is the canonical
/// state; on guests it is a replica rebuilt from host messages.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    players: BTreeMap<PeerId, Player>,
    current_drawer_id: Option<PeerId>,
    current_word: Option<String>,
    phase: Phase,
    time_remaining: u32,
    drawings: Vec<DrawingEvent>,
    round_winner_id: Option<PeerId>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Queries --

    pub fn players(&self) -> &BTreeMap<PeerId, Player> {
        &self.players
    }

    pub fn player(&self, id: &PeerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// The drawer of the current or most recent round.
    pub fn current_drawer_id(&self) -> Option<&PeerId> {
        self.current_drawer_id.as_ref()
    }

    /// The drawer, but only while a round is being drawn.
    pub fn active_drawer(&self) -> Option<&PeerId> {
        match self.phase {
            Phase::Drawing => self.current_drawer_id.as_ref(),
            _ => None,
        }
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn drawings(&self) -> &[DrawingEvent] {
        &self.drawings
    }

    pub fn round_winner_id(&self) -> Option<&PeerId> {
        self.round_winner_id.as_ref()
    }

    /// Returns `true` if there is at least one player and all are ready.
    pub fn all_ready(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.is_ready)
    }

    // -- Roster --

    /// Inserts a player, replacing any previous entry with the same id.
    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id.clone(), player);
    }

    /// Adds or refreshes a player from its own announcement.
    ///
    /// Only the name and ready flag are taken from `player`. Score and
    /// draw count are kept for a known id and start at zero otherwise.
    pub fn admit_player(&mut self, player: &Player) {
        match self.players.get_mut(&player.id) {
            Some(known) => {
                known.name = player.name.clone();
                known.is_ready = player.is_ready;
            }
            None => self.add_player(Player::new(
                player.id.clone(),
                player.name.clone(),
                player.is_ready,
            )),
        }
    }

    pub fn remove_player(&mut self, id: &PeerId) -> Option<Player> {
        self.players.remove(id)
    }

    /// Mutates one player in place. Returns `false` if the id is unknown.
    pub fn update_player(&mut self, id: &PeerId, f: impl FnOnce(&mut Player)) -> bool {
        match self.players.get_mut(id) {
            Some(player) => {
                f(player);
                true
            }
            None => false,
        }
    }

    pub fn set_player_ready(&mut self, id: &PeerId, is_ready: bool) -> bool {
        self.update_player(id, |p| p.is_ready = is_ready)
    }

    pub fn update_player_name(&mut self, id: &PeerId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.update_player(id, |p| p.name = name)
    }

    pub fn increment_draw_count(&mut self, id: &PeerId) -> bool {
        self.update_player(id, |p| p.draw_count += 1)
    }

    /// Replaces the whole roster with the host's.
    pub fn replace_players(&mut self, players: BTreeMap<PeerId, Player>) {
        self.players = players;
    }

    /// Overwrites scores of known players; unknown ids are skipped.
    pub fn update_scores(&mut self, scores: &BTreeMap<PeerId, u32>) {
        for (id, score) in scores {
            self.update_player(id, |p| p.score = *score);
        }
    }

    // -- Round --

    /// Begins a drawing round. Clears the drawing log and any previous
    /// winner.
    pub fn start_round(&mut self, drawer_id: PeerId, word: impl Into<String>, duration: u32) {
        self.current_drawer_id = Some(drawer_id);
        self.current_word = Some(word.into());
        self.phase = Phase::Drawing;
        self.time_remaining = duration;
        self.drawings.clear();
        self.round_winner_id = None;
    }

    /// Appends to the drawing log. Ignored outside [`Phase::Drawing`].
    pub fn add_drawing_event(&mut self, event: DrawingEvent) -> bool {
        if self.phase != Phase::Drawing {
            return false;
        }
        self.drawings.push(event);
        true
    }

    pub fn clear_drawings(&mut self) {
        self.drawings.clear();
    }

    /// Ends the round with `winner`, or with no winner on timeout.
    ///
    /// Idempotent: repeating the call only overwrites the winner. The word
    /// is kept so the round result can show it.
    pub fn end_round(&mut self, winner: Option<PeerId>) {
        self.phase = Phase::RoundEnd;
        self.round_winner_id = winner;
    }

    pub fn show_scoreboard(&mut self) {
        self.phase = Phase::Scoreboard;
    }

    pub fn set_time_remaining(&mut self, secs: u32) {
        self.time_remaining = secs;
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Back to an empty menu state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
