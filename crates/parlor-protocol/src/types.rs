//! Core protocol types for Parlor's wire format.
//!
//! Every structure here is serialized, sent to a peer, and deserialized
//! on the other side. Game-specific messages are *not* defined here: they
//! ride inside [`Payload::Game`] as opaque bytes and are parsed by the
//! game layer through [`decode_tagged`](crate::decode_tagged).

use serde::{Deserialize, Serialize};

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Version exchanged in [`SystemMessage::Hello`]. Hosts refuse guests
/// speaking a different version.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of one peer endpoint.
///
/// In the browser clients this is the identifier the peer-to-peer library
/// hands out; here it is a human-readable token chosen by the peer itself
/// and checked for uniqueness by the host during the handshake. It doubles
/// as the player id in game state.
///
/// `#[serde(transparent)]` makes `PeerId("x")` serialize as plain `"x"`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh human-readable identifier such as
    /// `"brave-otter-sings-0421"`.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let suffix: u16 = rng.random_range(0..10_000);
        Self(format!("{}-{suffix:04}", crate::human_id(rng)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Which side of a room this process is on.
///
/// The host created the room and is the single writer of round-affecting
/// transitions; guests apply what the host sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    /// Returns `true` for [`Role::Host`].
    pub fn is_host(self) -> bool {
        matches!(self, Role::Host)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Guest => f.write_str("guest"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies which connected peers should receive a message.
///
/// Game logic on the host returns `(Recipient, message)` pairs and the
/// session fans them out. A guest only has one connection (to the host),
/// so for guests every recipient resolves to "the host".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every open connection.
    All,

    /// One specific peer.
    Peer(PeerId),

    /// Everyone except the given peer, usually the original sender of a
    /// message being echoed.
    AllExcept(PeerId),
}

impl Recipient {
    /// Returns `true` if a message addressed to `self` should be delivered
    /// to `peer`.
    pub fn includes(&self, peer: &PeerId) -> bool {
        match self {
            Recipient::All => true,
            Recipient::Peer(target) => target == peer,
            Recipient::AllExcept(excluded) => excluded != peer,
        }
    }
}

// ---------------------------------------------------------------------------
// SystemMessage: session-level messages
// ---------------------------------------------------------------------------

/// Messages used by the session layer itself (not game-specific).
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, e.g.
/// `{ "type": "Hello", "version": 1, "peer_id": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Guest → Host: first frame on a new connection.
    Hello { version: u32, peer_id: PeerId },

    /// Host → Guest: the guest is admitted to the room.
    Welcome { host_id: PeerId },

    /// Either direction: "I'm leaving." Sent best-effort before closing.
    Disconnect { reason: String },

    /// Host → Guest: the handshake was refused. `code` follows HTTP-style
    /// conventions (400 bad request, 409 conflict, 426 upgrade required).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload: what's inside an envelope
// ---------------------------------------------------------------------------

/// The content of a frame: either a session message or game data.
///
/// Adjacently tagged, so the session can tell the two apart without
/// understanding game messages:
///   `{ "type": "System", "data": { "type": "Welcome", ... } }`
///   `{ "type": "Game", "data": [123, 34, ...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// A session-level message.
    System(SystemMessage),

    /// A game message encoded by the codec, opaque to the session.
    Game(Vec<u8>),
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level frame. Every message on the wire is an `Envelope`.
///
/// ```text
/// ┌─────────────────────────────────┐
/// │ seq: 42                         │  ← per-sender counter
/// │ timestamp: 1700000000000        │  ← sender wall clock, ms
/// │ ┌─────────────────────────────┐ │
/// │ │ payload: Game([...bytes...])│ │
/// │ └─────────────────────────────┘ │
/// └─────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Auto-incrementing sequence number, one counter per sending peer.
    pub seq: u64,

    /// Milliseconds since the Unix epoch on the sender's clock. Only used
    /// for logging; peers do not synchronise clocks.
    pub timestamp: u64,

    /// The message content.
    pub payload: Payload,
}

impl Envelope {
    /// Builds an envelope stamped with the current wall-clock time.
    pub fn new(seq: u64, payload: Payload) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self { seq, timestamp, payload }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_peer_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PeerId::new("quiet-owl")).unwrap();
        assert_eq!(json, "\"quiet-owl\"");
    }

    #[test]
    fn test_peer_id_generate_has_word_prefix_and_numeric_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = PeerId::generate(&mut rng);
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[3].len(), 4);
        assert!(parts[3].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_peer_id_generate_differs_between_draws() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = PeerId::generate(&mut rng);
        let b = PeerId::generate(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Host).unwrap(), "\"host\"");
        assert!(Role::Host.is_host());
        assert!(!Role::Guest.is_host());
    }

    #[test]
    fn test_recipient_includes() {
        let p1 = PeerId::new("p1");
        let p2 = PeerId::new("p2");

        assert!(Recipient::All.includes(&p1));
        assert!(Recipient::Peer(p1.clone()).includes(&p1));
        assert!(!Recipient::Peer(p1.clone()).includes(&p2));
        assert!(!Recipient::AllExcept(p1.clone()).includes(&p1));
        assert!(Recipient::AllExcept(p1).includes(&p2));
    }

    #[test]
    fn test_system_message_hello_json_format() {
        let msg = SystemMessage::Hello {
            version: PROTOCOL_VERSION,
            peer_id: PeerId::new("guest-1"),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Hello");
        assert_eq!(json["version"], 1);
        assert_eq!(json["peer_id"], "guest-1");
    }

    #[test]
    fn test_system_message_error_json_format() {
        let msg = SystemMessage::Error {
            code: 409,
            message: "peer id already in room".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], 409);
    }

    #[test]
    fn test_payload_game_is_adjacently_tagged() {
        let payload = Payload::Game(vec![1, 2, 3]);
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "Game");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_payload_system_nests_tagged_message() {
        let payload = Payload::System(SystemMessage::Welcome {
            host_id: PeerId::new("host"),
        });
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "System");
        assert_eq!(json["data"]["type"], "Welcome");
        assert_eq!(json["data"]["host_id"], "host");
    }

    #[test]
    fn test_envelope_new_stamps_current_time() {
        let env = Envelope::new(3, Payload::Game(vec![]));
        assert_eq!(env.seq, 3);
        // Any time after 2020-01-01.
        assert!(env.timestamp > 1_577_836_800_000);
    }

    #[test]
    fn test_envelope_rejects_unknown_payload_type() {
        let raw = r#"{"seq":1,"timestamp":0,"payload":{"type":"Video","data":[]}}"#;
        let result: Result<Envelope, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }
}
