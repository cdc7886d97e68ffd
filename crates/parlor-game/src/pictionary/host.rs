//! Host-side round driving.
//!
//! The host is the only peer that decides who draws, what the word is,
//! whether a guess is right and when a round is over. Every decision is
//! applied to the host's own state through [`Pictionary::apply`] and
//! emitted as an [`Effect::Send`], so guests replay exactly the same
//! transitions in exactly the host's order.

use parlor_protocol::{Inbound, PeerId, Recipient, TaggedMessage};
use rand::Rng;
use tracing::{debug, info, warn};

use super::rules::{Effect, Pictionary};
use super::{
    GameState, PictionaryMessage, Player, is_correct_guess, score_correct_guess,
    select_next_drawer,
};
use crate::{GameError, GameRules, Outcome, Phase, PictionaryConfig};

/// Round authority for the peer that created the room.
#[derive(Debug, Clone)]
pub struct RoundHost {
    config: PictionaryConfig,
    local_id: PeerId,
}

impl RoundHost {
    pub fn new(config: PictionaryConfig, local_id: PeerId) -> Self {
        Self { config, local_id }
    }

    pub fn config(&self) -> &PictionaryConfig {
        &self.config
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    /// Fresh lobby containing only the host, who is always ready.
    pub fn open_lobby(&self, state: &mut GameState) {
        state.reset();
        state.add_player(Player::new(
            self.local_id.clone(),
            self.config.host_name.clone(),
            true,
        ));
        state.set_phase(Phase::Lobby);
    }

    // -----------------------------------------------------------------------
    // Connection events
    // -----------------------------------------------------------------------

    /// A guest finished the handshake: replay any round in progress to it,
    /// then send the current roster.
    ///
    /// The replay is the same message sequence a guest present from the
    /// start would have seen, with the countdown at its remaining time.
    /// The roster goes last so it overrides the draw count `startRound`
    /// bumps on the guest.
    pub fn peer_connected(&self, state: &GameState, peer: &PeerId) -> Vec<Effect> {
        let mut catch_up = Vec::new();
        let round = match (state.phase(), state.current_drawer_id(), state.current_word()) {
            (Phase::Drawing | Phase::RoundEnd | Phase::Scoreboard, Some(drawer), Some(word)) => {
                Some((drawer, word))
            }
            _ => None,
        };
        if let Some((drawer, word)) = round {
            debug!(%peer, phase = %state.phase(), "catching up late joiner");
            catch_up.push(PictionaryMessage::StartRound {
                drawer_id: drawer.clone(),
                word: word.to_string(),
                duration: state.time_remaining(),
            });
            catch_up.extend(
                state
                    .drawings()
                    .iter()
                    .map(|event| PictionaryMessage::Drawing { event: event.clone() }),
            );
            if state.phase() != Phase::Drawing {
                catch_up.push(match state.round_winner_id() {
                    Some(winner) => PictionaryMessage::CorrectGuess {
                        player_id: winner.clone(),
                        word: word.to_string(),
                    },
                    None => PictionaryMessage::RoundTimeout { word: word.to_string() },
                });
            }
            if state.phase() == Phase::Scoreboard {
                catch_up.push(PictionaryMessage::ShowScoreboard);
            }
        }
        catch_up.push(PictionaryMessage::AllPlayers {
            players: state.players().clone(),
        });

        catch_up
            .into_iter()
            .map(|msg| Effect::Send(Recipient::Peer(peer.clone()), msg))
            .collect()
    }

    /// A guest dropped. Removes it and, if it was drawing, ends the round
    /// as a timeout so the game can move on.
    pub fn peer_left(&self, state: &mut GameState, peer: &PeerId) -> Vec<Effect> {
        let was_drawing = state.active_drawer() == Some(peer);
        if state.remove_player(peer).is_none() {
            return Vec::new();
        }
        info!(%peer, "player left");

        let mut effects = Vec::new();
        let players = state.players().clone();
        self.emit(state, PictionaryMessage::AllPlayers { players }, &mut effects);
        if was_drawing {
            info!(%peer, "drawer left mid-round");
            effects.extend(self.timeout(state));
        }
        effects
    }

    // -----------------------------------------------------------------------
    // Inbound dispatch
    // -----------------------------------------------------------------------

    /// Handles a message from a guest.
    ///
    /// Validates it, applies it, and echoes it according to the
    /// re-broadcast policy: `playerJoined` triggers a full roster
    /// broadcast; `playerReady`, `playerNameUpdate` and `drawing` are
    /// forwarded to everyone but the sender; `guess` is judged here.
    pub fn handle_message(
        &self,
        state: &mut GameState,
        sender: &PeerId,
        inbound: &Inbound<PictionaryMessage>,
    ) -> Outcome<Effect> {
        let Inbound::Known(msg) = inbound else {
            Pictionary::dispatch(state, inbound);
            return Outcome::unrecognized();
        };

        if let Err(reason) = Pictionary::validate(state, sender, msg) {
            warn!(%sender, kind = msg.type_name(), %reason, "rejected peer message");
            return Outcome::handled(Vec::new());
        }

        let effects = match msg {
            PictionaryMessage::Guess { player_id, guess } => self.guess(state, player_id, guess),
            PictionaryMessage::PlayerJoined { player } => {
                info!(peer = %player.id, name = %player.name, "player joined");
                Pictionary::apply(state, msg);
                let mut effects = Vec::new();
                let players = state.players().clone();
                self.emit(state, PictionaryMessage::AllPlayers { players }, &mut effects);
                effects
            }
            PictionaryMessage::PlayerReady { .. }
            | PictionaryMessage::PlayerNameUpdate { .. }
            | PictionaryMessage::Drawing { .. } => {
                Pictionary::apply(state, msg);
                vec![Effect::Send(Recipient::AllExcept(sender.clone()), msg.clone())]
            }
            _ => {
                Pictionary::apply(state, msg);
                Vec::new()
            }
        };
        Outcome::handled(effects)
    }

    // -----------------------------------------------------------------------
    // Round lifecycle
    // -----------------------------------------------------------------------

    /// `lobby → drawing`: picks a drawer and starts a round with `word`.
    pub fn start_round(
        &self,
        state: &mut GameState,
        word: &str,
        rng: &mut impl Rng,
    ) -> Result<Vec<Effect>, GameError> {
        self.require(state, Phase::Drawing)?;
        let drawer = select_next_drawer(state.players(), rng).ok_or(GameError::NoPlayers)?;
        self.begin_round(state, drawer, word)
    }

    /// `lobby → drawing` with an explicit drawer.
    pub fn begin_round(
        &self,
        state: &mut GameState,
        drawer: PeerId,
        word: &str,
    ) -> Result<Vec<Effect>, GameError> {
        self.require(state, Phase::Drawing)?;
        if state.player(&drawer).is_none() {
            return Err(GameError::NoPlayers);
        }
        let duration = self.config.round_duration_secs;
        info!(%drawer, duration, "round started");

        let mut effects = vec![Effect::CancelScoreboard];
        self.emit(
            state,
            PictionaryMessage::StartRound {
                drawer_id: drawer,
                word: word.to_string(),
                duration,
            },
            &mut effects,
        );
        effects.push(Effect::StartCountdown(duration));
        Ok(effects)
    }

    /// Judges a guess. A match ends the round with scores; anything else,
    /// including a guess after the round already ended, is ignored.
    pub fn guess(&self, state: &mut GameState, guesser: &PeerId, text: &str) -> Vec<Effect> {
        let (Some(drawer), Some(word)) = (state.active_drawer(), state.current_word()) else {
            debug!(%guesser, "guess outside a drawing round");
            return Vec::new();
        };
        if drawer == guesser || state.player(guesser).is_none() {
            debug!(%guesser, "guess from drawer or unknown player");
            return Vec::new();
        }
        if !is_correct_guess(text, word) {
            return Vec::new();
        }

        let drawer = drawer.clone();
        let word = word.to_string();
        let scores = score_correct_guess(state.players(), guesser, &drawer, &self.config);
        info!(%guesser, %drawer, "correct guess");

        let mut effects = Vec::new();
        self.emit(state, PictionaryMessage::UpdateScores { scores }, &mut effects);
        self.emit(
            state,
            PictionaryMessage::CorrectGuess {
                player_id: guesser.clone(),
                word,
            },
            &mut effects,
        );
        effects.push(Effect::StopCountdown);
        effects.push(Effect::ScheduleScoreboard(self.config.scoreboard_delay));
        effects
    }

    /// The countdown reached zero. No-op unless a round is being drawn.
    pub fn timeout(&self, state: &mut GameState) -> Vec<Effect> {
        if state.phase() != Phase::Drawing {
            return Vec::new();
        }
        let word = state.current_word().unwrap_or_default().to_string();
        info!("round timed out");

        let mut effects = Vec::new();
        self.emit(state, PictionaryMessage::RoundTimeout { word }, &mut effects);
        effects.push(Effect::StopCountdown);
        effects.push(Effect::ScheduleScoreboard(self.config.scoreboard_delay));
        effects
    }

    /// `roundEnd → scoreboard` when the display delay fires. No-op if the
    /// phase moved on in the meantime.
    pub fn scoreboard_due(&self, state: &mut GameState) -> Vec<Effect> {
        if !state.phase().can_transition_to(Phase::Scoreboard) {
            debug!(phase = %state.phase(), "stale scoreboard delay");
            return Vec::new();
        }
        let mut effects = Vec::new();
        self.emit(state, PictionaryMessage::ShowScoreboard, &mut effects);
        effects
    }

    /// `scoreboard → lobby → drawing`: the host's "continue" action.
    pub fn continue_game(
        &self,
        state: &mut GameState,
        word: &str,
        rng: &mut impl Rng,
    ) -> Result<Vec<Effect>, GameError> {
        self.require(state, Phase::Lobby)?;
        let mut effects = Vec::new();
        self.emit(state, PictionaryMessage::ContinueGame, &mut effects);
        effects.extend(self.start_round(state, word, rng)?);
        Ok(effects)
    }

    /// `scoreboard → menu`: the host's "finish" action.
    pub fn finish(&self, state: &mut GameState) -> Result<Vec<Effect>, GameError> {
        self.require(state, Phase::Menu)?;
        info!("game finished");
        let mut effects = vec![Effect::CancelScoreboard, Effect::StopCountdown];
        self.emit(state, PictionaryMessage::GameEnd, &mut effects);
        effects.push(Effect::EndSession);
        Ok(effects)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require(&self, state: &GameState, target: Phase) -> Result<(), GameError> {
        let from = state.phase();
        if from.can_transition_to(target) {
            Ok(())
        } else {
            Err(GameError::InvalidTransition { from, to: target })
        }
    }

    /// Applies a host-originated message locally and queues it for all.
    fn emit(&self, state: &mut GameState, msg: PictionaryMessage, effects: &mut Vec<Effect>) {
        Pictionary::apply(state, &msg);
        effects.push(Effect::Send(Recipient::All, msg));
    }
}
