//! Structured parsing of game payloads.
//!
//! Game messages are closed, internally tagged unions (`{"type": ...}`).
//! Peers running a newer client may send types this build does not know,
//! and a buggy peer may send garbage. Neither must crash the session, so
//! decoding is a two-step parse that classifies instead of failing hard:
//!
//! 1. Probe only the `type` field. No field at all is a protocol error.
//! 2. If the tag is one this build knows, decode the full message; field
//!    errors at this point are a protocol error too.
//! 3. Otherwise report [`Inbound::Unrecognized`], which the dispatcher
//!    ignores.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{Codec, ProtocolError};

/// A closed message union whose wire form carries a `type` tag.
pub trait TaggedMessage: DeserializeOwned {
    /// Every `type` tag this union can decode.
    const TYPES: &'static [&'static str];

    /// The wire tag of this message.
    fn type_name(&self) -> &'static str;
}

/// Outcome of decoding a well-formed game payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound<M> {
    /// A message type this build understands.
    Known(M),

    /// A syntactically valid message with a tag this build does not know.
    Unrecognized(String),
}

impl<M> Inbound<M> {
    /// Returns the known message, if any.
    pub fn known(self) -> Option<M> {
        match self {
            Inbound::Known(msg) => Some(msg),
            Inbound::Unrecognized(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct Discriminator {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Decodes a game payload into `M`, classifying unknown tags instead of
/// failing.
///
/// # Errors
/// - [`ProtocolError::MissingDiscriminator`] if there is no `type` field.
/// - [`ProtocolError::Decode`] if the bytes are not a valid object, or a
///   known tag carries malformed fields.
pub fn decode_tagged<M, C>(codec: &C, data: &[u8]) -> Result<Inbound<M>, ProtocolError>
where
    M: TaggedMessage,
    C: Codec,
{
    let probe: Discriminator = codec.decode(data)?;
    let kind = probe.kind.ok_or(ProtocolError::MissingDiscriminator)?;

    if !M::TYPES.contains(&kind.as_str()) {
        return Ok(Inbound::Unrecognized(kind));
    }
    codec.decode(data).map(Inbound::Known)
}
