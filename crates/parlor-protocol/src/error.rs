//! Error types for the protocol layer.
//!
//! When you see a `ProtocolError`, the problem is in framing or parsing,
//! not in networking or game rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, wrong data
    /// types, or truncated frames.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A game payload did not carry a `type` discriminator.
    #[error("message has no type discriminator")]
    MissingDiscriminator,

    /// A room code was empty or contained characters that cannot be
    /// shared in a URL.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),

    /// The message parsed but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
