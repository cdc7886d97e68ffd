use crate::ConnectionId;

/// Failures below the peer protocol: sockets and WebSocket framing.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a TCP connection or upgrading it to a WebSocket failed.
    #[error("accept failed: {0}")]
    Accept(String),

    #[error("could not reach {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The connection was already closed, locally or by the peer.
    #[error("{0} is closed")]
    Closed(ConnectionId),

    #[error("send on {id} failed: {reason}")]
    Send { id: ConnectionId, reason: String },

    #[error("receive on {id} failed: {reason}")]
    Receive { id: ConnectionId, reason: String },
}
