//! Error types for the session layer.

use parlor_protocol::{PeerId, ProtocolError, RoomCode};
use parlor_transport::TransportError;

/// Errors that can occur while creating, joining or using a room.
///
/// Room setup failures are delivered as
/// [`SessionEvent::Error`](crate::SessionEvent::Error) rather than
/// returned, so a client only has one place to look.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The underlying connection failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No host has registered this room code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The rendezvous store could not be read or written.
    #[error("rendezvous failed: {0}")]
    Rendezvous(String),

    /// The rendezvous did not answer in time.
    #[error("rendezvous timed out")]
    RendezvousTimeout,

    /// The host could not be reached in time.
    #[error("connecting to {0} timed out")]
    ConnectTimeout(String),

    /// The other side did not complete the hello/welcome exchange in time.
    #[error("handshake timed out")]
    HandshakeTimeout,

    /// The host refused the connection.
    #[error("host rejected connection ({code}): {message}")]
    Rejected { code: u16, message: String },

    /// The peer id is already registered in this room.
    #[error("peer {0} is already connected")]
    AlreadyConnected(PeerId),

    /// The session is already hosting or has already joined a room.
    #[error("session is already in a room")]
    AlreadyInRoom,

    /// The operation needs an active room.
    #[error("session is not in a room")]
    NotInRoom,
}
