//! Peer sessions for Parlor.
//!
//! One process hosts a room, others join it by code. This crate owns
//! everything between "I have a room code" and "here is a decoded game
//! message from peer X":
//!
//! 1. **Rendezvous**: publishing and resolving room codes ([`Rendezvous`]).
//! 2. **Handshake**: hello/welcome with version and peer-id checks.
//! 3. **Connection tracking**: who is connected ([`ConnectionRegistry`]).
//! 4. **Fan-out and teardown**: [`PeerSession::send`], [`PeerSession::cleanup`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Client loop (above)  ← drains SessionEvent, executes game effects
//!     ↕
//! Session Layer (this crate)  ← rooms, handshakes, peers, fan-out
//!     ↕
//! Protocol / Transport (below)  ← envelopes, codecs, WebSocket frames
//! ```
//!
//! The topology is a star: guests connect only to the host, and the host
//! relays whatever the game rules say to relay.

mod config;
mod error;
mod registry;
mod rendezvous;
mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use registry::ConnectionRegistry;
pub use rendezvous::{DirectoryRendezvous, LocalRendezvous, Rendezvous, WithFallback};
pub use session::{
    BAD_HANDSHAKE, DUPLICATE_PEER, PeerSession, SessionEvent, VERSION_MISMATCH,
};
