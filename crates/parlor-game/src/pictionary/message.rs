use std::collections::BTreeMap;

use parlor_protocol::{PeerId, TaggedMessage};
use serde::{Deserialize, Serialize};

use super::{DrawingEvent, Player};

/// Every message Pictionary peers exchange.
///
/// Internally tagged with camelCase tags and fields, e.g.
/// `{"type":"playerReady","playerId":"p2","isReady":true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PictionaryMessage {
    /// Guest → host on connect; host answers with `allPlayers`.
    PlayerJoined { player: Player },
    PlayerReady { player_id: PeerId, is_ready: bool },
    PlayerNameUpdate { player_id: PeerId, name: String },
    /// Full roster; replaces the receiver's player map.
    AllPlayers { players: BTreeMap<PeerId, Player> },
    StartRound {
        drawer_id: PeerId,
        word: String,
        /// Round length in seconds.
        duration: u32,
    },
    Drawing { event: DrawingEvent },
    /// Guest → host only. The host judges it and never forwards it.
    Guess { player_id: PeerId, guess: String },
    CorrectGuess { player_id: PeerId, word: String },
    RoundTimeout { word: String },
    /// Absolute scores, not deltas.
    UpdateScores { scores: BTreeMap<PeerId, u32> },
    ShowScoreboard,
    ContinueGame,
    GameEnd,
}

impl PictionaryMessage {
    /// Returns `true` for messages only the host may originate.
    pub fn is_host_authoritative(&self) -> bool {
        matches!(
            self,
            Self::AllPlayers { .. }
                | Self::StartRound { .. }
                | Self::CorrectGuess { .. }
                | Self::RoundTimeout { .. }
                | Self::UpdateScores { .. }
                | Self::ShowScoreboard
                | Self::ContinueGame
                | Self::GameEnd
        )
    }
}

impl TaggedMessage for PictionaryMessage {
    const TYPES: &'static [&'static str] = &[
        "playerJoined",
        "playerReady",
        "playerNameUpdate",
        "allPlayers",
        "startRound",
        "drawing",
        "guess",
        "correctGuess",
        "roundTimeout",
        "updateScores",
        "showScoreboard",
        "continueGame",
        "gameEnd",
    ];

    fn type_name(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerReady { .. } => "playerReady",
            Self::PlayerNameUpdate { .. } => "playerNameUpdate",
            Self::AllPlayers { .. } => "allPlayers",
            Self::StartRound { .. } => "startRound",
            Self::Drawing { .. } => "drawing",
            Self::Guess { .. } => "guess",
            Self::CorrectGuess { .. } => "correctGuess",
            Self::RoundTimeout { .. } => "roundTimeout",
            Self::UpdateScores { .. } => "updateScores",
            Self::ShowScoreboard => "showScoreboard",
            Self::ContinueGame => "continueGame",
            Self::GameEnd => "gameEnd",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_protocol::{Inbound, JsonCodec, decode_tagged};

    fn decode(raw: &str) -> Inbound<PictionaryMessage> {
        decode_tagged(&JsonCodec, raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_every_variant_tag_is_listed() {
        let p = PeerId::new("p");
        let samples = vec![
            PictionaryMessage::PlayerJoined { player: Player::new(p.clone(), "x", false) },
            PictionaryMessage::PlayerReady { player_id: p.clone(), is_ready: true },
            PictionaryMessage::PlayerNameUpdate { player_id: p.clone(), name: "n".into() },
            PictionaryMessage::AllPlayers { players: BTreeMap::new() },
            PictionaryMessage::StartRound { drawer_id: p.clone(), word: "w".into(), duration: 1 },
            PictionaryMessage::Drawing { event: DrawingEvent::Clear { timestamp: 0 } },
            PictionaryMessage::Guess { player_id: p.clone(), guess: "g".into() },
            PictionaryMessage::CorrectGuess { player_id: p.clone(), word: "w".into() },
            PictionaryMessage::RoundTimeout { word: "w".into() },
            PictionaryMessage::UpdateScores { scores: BTreeMap::new() },
            PictionaryMessage::ShowScoreboard,
            PictionaryMessage::ContinueGame,
            PictionaryMessage::GameEnd,
        ];
        assert_eq!(samples.len(), PictionaryMessage::TYPES.len());

        for msg in samples {
            let json = serde_json::to_value(&msg).unwrap();
            assert_eq!(json["type"], msg.type_name());
            assert!(PictionaryMessage::TYPES.contains(&msg.type_name()));
        }
    }

    #[test]
    fn test_start_round_wire_shape() {
        let msg = PictionaryMessage::StartRound {
            drawer_id: PeerId::new("P1"),
            word: "house".into(),
            duration: 120,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "startRound", "drawerId": "P1", "word": "house", "duration": 120})
        );
    }

    #[test]
    fn test_unit_variants_accept_empty_object() {
        assert_eq!(
            decode(r#"{"type":"showScoreboard"}"#),
            Inbound::Known(PictionaryMessage::ShowScoreboard)
        );
    }

    #[test]
    fn test_guess_from_browser_client_decodes() {
        let msg = decode(r#"{"type":"guess","playerId":"P2","guess":"House "}"#);
        assert_eq!(
            msg,
            Inbound::Known(PictionaryMessage::Guess {
                player_id: PeerId::new("P2"),
                guess: "House ".into(),
            })
        );
    }

    #[test]
    fn test_all_players_decodes_object_map() {
        let raw = r#"{"type":"allPlayers","players":{"a":{"id":"a","name":"Host","score":5,"drawCount":1,"isReady":true}}}"#;
        let Inbound::Known(PictionaryMessage::AllPlayers { players }) = decode(raw) else {
            panic!("expected allPlayers");
        };
        assert_eq!(players[&PeerId::new("a")].score, 5);
    }

    #[test]
    fn test_future_message_type_is_unrecognized() {
        assert_eq!(
            decode(r#"{"type":"chat","text":"hi"}"#),
            Inbound::Unrecognized("chat".into())
        );
    }

    #[test]
    fn test_is_host_authoritative() {
        assert!(PictionaryMessage::GameEnd.is_host_authoritative());
        assert!(PictionaryMessage::RoundTimeout { word: "x".into() }.is_host_authoritative());
        assert!(!PictionaryMessage::Guess { player_id: PeerId::new("p"), guess: "x".into() }
            .is_host_authoritative());
        assert!(!PictionaryMessage::Drawing { event: DrawingEvent::Clear { timestamp: 0 } }
            .is_host_authoritative());
    }
}
