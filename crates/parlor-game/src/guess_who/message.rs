use parlor_protocol::TaggedMessage;
use serde::{Deserialize, Serialize};

/// A face on the board.
///
/// Ids are reassigned by the fetch pipeline so they are unique and
/// contiguous within one board; upstream API ids are never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Character {
    pub id: u32,
    pub name: String,
    /// Image URL.
    pub image: String,
}

/// Every message Guess-Who peers exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GuessWhoMessage {
    /// Host → guest: the guest's board and secret.
    GameStart {
        characters: Vec<Character>,
        secret: Character,
    },
    /// The sender's complete crossed-out set, not a delta.
    CrossOut { crossed_out: Vec<u32> },
    /// Guest → host once connected; asks the host to deal.
    Ready,
    NameUpdate { name: String },
}

impl TaggedMessage for GuessWhoMessage {
    const TYPES: &'static [&'static str] = &["gameStart", "crossOut", "ready", "nameUpdate"];

    fn type_name(&self) -> &'static str {
        match self {
            Self::GameStart { .. } => "gameStart",
            Self::CrossOut { .. } => "crossOut",
            Self::Ready => "ready",
            Self::NameUpdate { .. } => "nameUpdate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_protocol::{Inbound, JsonCodec, decode_tagged};

    #[test]
    fn test_cross_out_wire_shape() {
        let json = serde_json::to_value(GuessWhoMessage::CrossOut {
            crossed_out: vec![3, 1],
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "crossOut", "crossedOut": [3, 1]}));
    }

    #[test]
    fn test_game_start_from_browser_client_decodes() {
        let raw = r#"{"type":"gameStart","characters":[{"id":0,"name":"Rick","image":"r.png"}],"secret":{"id":0,"name":"Rick","image":"r.png"}}"#;
        let msg: Inbound<GuessWhoMessage> = decode_tagged(&JsonCodec, raw.as_bytes()).unwrap();

        let Inbound::Known(GuessWhoMessage::GameStart { characters, secret }) = msg else {
            panic!("expected gameStart");
        };
        assert_eq!(characters.len(), 1);
        assert_eq!(secret.name, "Rick");
    }

    #[test]
    fn test_ready_wire_shape() {
        let json = serde_json::to_string(&GuessWhoMessage::Ready).unwrap();
        assert_eq!(json, r#"{"type":"ready"}"#);
    }

    #[test]
    fn test_type_names_match_wire_tags() {
        let samples = [
            GuessWhoMessage::CrossOut { crossed_out: vec![] },
            GuessWhoMessage::Ready,
            GuessWhoMessage::NameUpdate { name: "x".into() },
        ];
        for msg in samples {
            let json = serde_json::to_value(&msg).unwrap();
            assert_eq!(json["type"], msg.type_name());
        }
    }
}
