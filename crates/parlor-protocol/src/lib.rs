//! Wire protocol for Parlor.
//!
//! This crate defines the "language" that peers speak:
//!
//! - **Identity** ([`PeerId`], [`RoomCode`], [`Role`]): who is talking
//!   and which room they are in.
//! - **Types** ([`Envelope`], [`SystemMessage`], [`Recipient`]): the
//!   structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures are
//!   converted to/from bytes.
//! - **Tagged decoding** ([`TaggedMessage`], [`decode_tagged`]): the
//!   structured parse step that turns game bytes into either a known
//!   message or an "unrecognized" marker, never a panic.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session (peer context) → Game
//! ```
//!
//! The protocol layer does not know about connections or game rules. It
//! only knows how to frame, serialize and classify messages.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod room_code;
mod tagged;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use room_code::{RoomCode, human_id};
pub use tagged::{Inbound, TaggedMessage, decode_tagged};
pub use types::{
    Envelope, PROTOCOL_VERSION, Payload, PeerId, Recipient, Role,
    SystemMessage,
};
