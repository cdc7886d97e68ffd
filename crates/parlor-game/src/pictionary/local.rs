//! Actions the local player takes, on either side of the room.
//!
//! Each applies the change to local state first and returns the message
//! to send. A guest sends it to the host, which forwards it; the host
//! sends it to everyone.

use parlor_protocol::PeerId;

use super::{DrawingEvent, GameState, PictionaryMessage, Player};

/// Adds a joining guest to its own roster and returns its introduction.
pub fn introduce(state: &mut GameState, me: &PeerId) -> PictionaryMessage {
    let short: String = me.as_str().chars().take(4).collect();
    let player = Player::new(me.clone(), format!("Player {short}"), false);
    state.add_player(player.clone());
    PictionaryMessage::PlayerJoined { player }
}

/// Flips the local player's ready flag.
pub fn toggle_ready(state: &mut GameState, me: &PeerId) -> Option<PictionaryMessage> {
    let is_ready = !state.player(me)?.is_ready;
    state.set_player_ready(me, is_ready);
    Some(PictionaryMessage::PlayerReady {
        player_id: me.clone(),
        is_ready,
    })
}

pub fn rename(state: &mut GameState, me: &PeerId, name: &str) -> Option<PictionaryMessage> {
    let name = name.trim();
    if name.is_empty() || !state.update_player_name(me, name) {
        return None;
    }
    Some(PictionaryMessage::PlayerNameUpdate {
        player_id: me.clone(),
        name: name.to_string(),
    })
}

/// Records a finished stroke or a canvas clear. Only the active drawer
/// may draw.
pub fn draw(state: &mut GameState, me: &PeerId, event: DrawingEvent) -> Option<PictionaryMessage> {
    if state.active_drawer() != Some(me) {
        return None;
    }
    state.add_drawing_event(event.clone());
    Some(PictionaryMessage::Drawing { event })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Phase;

    #[test]
    fn test_introduce_uses_short_id_name() {
        let mut state = GameState::new();
        let me = PeerId::new("brave-otter-sings-0042");
        let msg = introduce(&mut state, &me);

        let PictionaryMessage::PlayerJoined { player } = msg else {
            panic!("expected playerJoined");
        };
        assert_eq!(player.name, "Player brav");
        assert!(!player.is_ready);
        assert_eq!(state.player(&me), Some(&player));
    }

    #[test]
    fn test_toggle_ready_flips_and_reports() {
        let mut state = GameState::new();
        let me = PeerId::new("me");
        assert!(toggle_ready(&mut state, &me).is_none());

        introduce(&mut state, &me);
        let msg = toggle_ready(&mut state, &me).unwrap();
        assert_eq!(
            msg,
            PictionaryMessage::PlayerReady { player_id: me.clone(), is_ready: true }
        );
        assert!(state.player(&me).unwrap().is_ready);
    }

    #[test]
    fn test_rename_rejects_blank() {
        let mut state = GameState::new();
        let me = PeerId::new("me");
        introduce(&mut state, &me);

        assert!(rename(&mut state, &me, "   ").is_none());
        assert!(rename(&mut state, &me, " Ada ").is_some());
        assert_eq!(state.player(&me).unwrap().name, "Ada");
    }

    #[test]
    fn test_draw_only_for_active_drawer() {
        let mut state = GameState::new();
        let me = PeerId::new("me");
        introduce(&mut state, &me);
        let event = DrawingEvent::Clear { timestamp: 1 };

        assert!(draw(&mut state, &me, event.clone()).is_none());

        state.start_round(me.clone(), "cat", 60);
        assert_eq!(state.phase(), Phase::Drawing);
        assert!(draw(&mut state, &me, event.clone()).is_some());
        assert!(draw(&mut state, &PeerId::new("other"), event).is_none());
        assert_eq!(state.drawings().len(), 1);
    }
}
