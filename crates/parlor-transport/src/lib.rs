//! Byte-level transport for Parlor peers.
//!
//! A *host* binds a [`Transport`] and accepts connections from guests; a
//! *guest* dials the host directly. Either way each side ends up holding a
//! [`Connection`] that moves opaque byte frames. Nothing at this layer
//! knows about room codes, message types or games; that lives in
//! `parlor-protocol` and `parlor-session`.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Tags a connection in logs until the peer behind it has said who it is.
///
/// Unique within one process, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// The host's listening endpoint.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next guest and completes the transport-level
    /// upgrade. Peer-level handshakes happen above this layer.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address guests should dial. With port `0` at bind time this is
    /// where the real port shows up.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;

    /// Stops accepting new connections. Open connections are unaffected.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// One open link to a peer.
///
/// All methods take `&self`: a reader task may sit in [`recv`](Self::recv)
/// while other tasks send through the same connection.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Next frame, or `Ok(None)` once the peer has closed cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the link. Closing twice is not an error.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_next_never_repeats() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_connection_id_display_tags_number() {
        let id = ConnectionId::next();
        assert_eq!(id.to_string(), format!("conn#{}", id.as_u64()));
    }
}
