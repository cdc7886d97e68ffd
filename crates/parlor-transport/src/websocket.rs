//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Accepted and dialed connections share one stream type so the session
//! layer can treat host-side and guest-side connections identically.
//! Each connection is split into a sink half and a stream half behind
//! separate locks, so a reader parked in [`Connection::recv`] never holds
//! up a concurrent [`Connection::send`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace};

use crate::{Connection, ConnectionId, Transport, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Listens for guests on a TCP port and upgrades each to a WebSocket.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds to `addr`. Port `0` lets the OS pick; see
    /// [`Transport::local_addr`].
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!(addr, "listening for peers");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<WebSocketConnection, TransportError> {
        let (tcp, remote) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::Accept(e.to_string()))?;

        let ws = tokio_tungstenite::accept_async(MaybeTlsStream::Plain(tcp))
            .await
            .map_err(|e| TransportError::Accept(format!("upgrade from {remote}: {e}")))?;

        let conn = WebSocketConnection::from_stream(ws);
        debug!(conn_id = %conn.id, %remote, "accepted peer connection");
        Ok(conn)
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(|e| TransportError::Accept(e.to_string()))
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        // The listener closes when the transport is dropped.
        Ok(())
    }
}

/// A single WebSocket connection, either accepted or dialed.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    closed: AtomicBool,
}

impl WebSocketConnection {
    /// Dials a host endpoint such as `ws://127.0.0.1:4000`.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let conn = Self::from_stream(ws);
        debug!(conn_id = %conn.id, url, "dialed host");
        Ok(conn)
    }

    fn from_stream(ws: WsStream) -> Self {
        let (sink, stream) = ws.split();
        Self {
            id: ConnectionId::next(),
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            closed: AtomicBool::new(false),
        }
    }

    fn send_error(&self, e: impl std::fmt::Display) -> TransportError {
        TransportError::Send {
            id: self.id,
            reason: e.to_string(),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed(self.id));
        }
        self.sink
            .lock()
            .await
            .send(Message::Binary(frame.to_vec().into()))
            .await
            .map_err(|e| self.send_error(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(other)) => trace!(conn_id = %self.id, kind = ?other, "control frame"),
                Some(Err(e)) => {
                    return Err(TransportError::Receive {
                        id: self.id,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| self.send_error(e))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
