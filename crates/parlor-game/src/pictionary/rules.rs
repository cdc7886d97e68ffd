//! Message application and the effects a client must carry out.

use std::time::Duration;

use parlor_protocol::{Inbound, PeerId, Recipient, TaggedMessage};

use super::{GameState, PictionaryMessage};
use crate::{GameRules, Outcome, Phase};

/// Marker type carrying the Pictionary [`GameRules`].
pub struct Pictionary;

impl GameRules for Pictionary {
    type State = GameState;
    type Message = PictionaryMessage;

    fn apply(state: &mut GameState, msg: &PictionaryMessage) {
        use PictionaryMessage as M;

        match msg {
            M::PlayerJoined { player } => state.admit_player(player),
            M::PlayerReady { player_id, is_ready } => {
                state.set_player_ready(player_id, *is_ready);
            }
            M::PlayerNameUpdate { player_id, name } => {
                state.update_player_name(player_id, name.clone());
            }
            M::AllPlayers { players } => state.replace_players(players.clone()),
            M::StartRound { drawer_id, word, duration } => {
                state.start_round(drawer_id.clone(), word.clone(), *duration);
                state.increment_draw_count(drawer_id);
            }
            M::Drawing { event } => {
                state.add_drawing_event(event.clone());
            }
            // Judged by the host, never applied as state.
            M::Guess { .. } => {}
            M::CorrectGuess { player_id, .. } => state.end_round(Some(player_id.clone())),
            M::RoundTimeout { .. } => state.end_round(None),
            M::UpdateScores { scores } => state.update_scores(scores),
            M::ShowScoreboard => state.show_scoreboard(),
            M::ContinueGame => state.set_phase(Phase::Lobby),
            M::GameEnd => state.reset(),
        }
    }

    fn validate(
        state: &GameState,
        sender: &PeerId,
        msg: &PictionaryMessage,
    ) -> Result<(), String> {
        use PictionaryMessage as M;

        if msg.is_host_authoritative() {
            return Err(format!("{} may only come from the host", msg.type_name()));
        }
        let claimed = match msg {
            M::PlayerJoined { player } => Some(&player.id),
            M::PlayerReady { player_id, .. }
            | M::PlayerNameUpdate { player_id, .. }
            | M::Guess { player_id, .. } => Some(player_id),
            _ => None,
        };
        match claimed {
            Some(claimed) if claimed != sender => {
                return Err(format!("{sender} cannot act for {claimed}"));
            }
            _ => {}
        }
        if matches!(msg, M::Drawing { .. }) && state.active_drawer() != Some(sender) {
            return Err(format!("{sender} is not the drawer"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Something the client loop must do after a state transition.
///
/// Game code never touches sockets or timers directly; it returns
/// effects, and the client executes them in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a message through the session.
    Send(Recipient, PictionaryMessage),
    /// Reset the round countdown to this many seconds and start it.
    StartCountdown(u32),
    StopCountdown,
    /// Arm the round-result → scoreboard delay.
    ScheduleScoreboard(Duration),
    /// Disarm a pending scoreboard delay.
    CancelScoreboard,
    /// The game is over; tear the session down.
    EndSession,
}

/// Applies a message received from the host and derives the guest's
/// local timer effects.
///
/// Guests run their own countdown for display only; the host's
/// `roundTimeout` is what actually ends a round.
pub fn guest_dispatch(
    state: &mut GameState,
    inbound: &Inbound<PictionaryMessage>,
) -> Outcome<Effect> {
    if !Pictionary::dispatch(state, inbound) {
        return Outcome::unrecognized();
    }
    let Inbound::Known(msg) = inbound else {
        return Outcome::unrecognized();
    };

    let effects = match msg {
        PictionaryMessage::StartRound { duration, .. } => vec![Effect::StartCountdown(*duration)],
        PictionaryMessage::CorrectGuess { .. } | PictionaryMessage::RoundTimeout { .. } => {
            vec![Effect::StopCountdown]
        }
        PictionaryMessage::GameEnd => vec![Effect::StopCountdown, Effect::EndSession],
        _ => Vec::new(),
    };
    Outcome::handled(effects)
}
