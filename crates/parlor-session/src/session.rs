//! The peer session: one room, seen from one process.
//!
//! The flow for each side is:
//!
//! ```text
//! host:  bind → register code → RoomReady
//!        accept → Hello ─┬─ ok        → Welcome → PeerJoined → read loop → PeerLeft
//!                        └─ duplicate → Error(409)
//!                           version   → Error(426)
//!
//! guest: resolve code → connect → Hello → Welcome → Connected → read loop → Disconnected
//! ```
//!
//! Everything after the call returns is reported on the event channel.
//! Reader tasks decode game payloads with [`decode_tagged`]; frames that
//! do not parse are logged and dropped here and never reach the caller.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parlor_protocol::{
    Codec, Envelope, Inbound, JsonCodec, PROTOCOL_VERSION, Payload, PeerId, ProtocolError,
    Recipient, Role, RoomCode, SystemMessage, TaggedMessage, decode_tagged,
};
use parlor_transport::{
    Connection, Transport, TransportError, WebSocketConnection, WebSocketTransport,
};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{ConnectionRegistry, Rendezvous, SessionConfig, SessionError};

/// Error code sent when a guest's protocol version differs.
pub const VERSION_MISMATCH: u16 = 426;
/// Error code sent when a guest reuses a peer id already in the room.
pub const DUPLICATE_PEER: u16 = 409;
/// Error code sent when the first frame is not a hello.
pub const BAD_HANDSHAKE: u16 = 400;

/// Something that happened to the session.
#[derive(Debug)]
pub enum SessionEvent<M> {
    /// Host: the room is open and registered under `code`.
    RoomReady { code: RoomCode },

    /// Host: a guest completed the handshake.
    PeerJoined(PeerId),

    /// Guest: the host accepted us.
    Connected { host: PeerId },

    /// A game message from `from`.
    Message { from: PeerId, message: Inbound<M> },

    /// Host: a guest's connection ended.
    PeerLeft(PeerId),

    /// Guest: the connection to the host ended.
    Disconnected,

    /// Creating or joining the room failed.
    Error(SessionError),
}

/// State shared between the session handle and its background tasks.
struct Shared<M, C> {
    local_id: PeerId,
    codec: C,
    config: SessionConfig,
    registry: Mutex<ConnectionRegistry<WebSocketConnection>>,
    events: mpsc::Sender<SessionEvent<M>>,
    seq: AtomicU64,
}

impl<M, C: Codec> Shared<M, C> {
    /// Queues an event. Returns `false` once nobody is listening.
    async fn emit(&self, event: SessionEvent<M>) -> bool {
        self.events.send(event).await.is_ok()
    }

    fn frame(&self, payload: Payload) -> Result<Vec<u8>, ProtocolError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.codec.encode(&Envelope::new(seq, payload))
    }

    async fn send_system(
        &self,
        conn: &WebSocketConnection,
        message: SystemMessage,
    ) -> Result<(), SessionError> {
        let bytes = self.frame(Payload::System(message))?;
        conn.send(&bytes).await?;
        Ok(())
    }

    /// Sends an error frame and builds the matching local error.
    async fn reject(&self, conn: &WebSocketConnection, code: u16, message: String) -> SessionError {
        let error = SystemMessage::Error { code, message: message.clone() };
        if let Err(e) = self.send_system(conn, error).await {
            debug!(conn_id = %conn.id(), error = %e, "could not deliver rejection");
        }
        SessionError::Rejected { code, message }
    }
}

/// A host or guest endpoint for one room.
///
/// `M` is the game's message union, `R` the rendezvous used to publish or
/// find the room, `C` the wire codec.
///
/// A host talks to every guest; a guest only ever talks to the host. For a
/// guest every [`Recipient`] therefore resolves to the host connection.
pub struct PeerSession<M, R: Rendezvous, C: Codec = JsonCodec> {
    shared: Arc<Shared<M, C>>,
    rendezvous: Arc<R>,
    role: Option<Role>,
    room_code: Option<RoomCode>,
    /// Dropping the sender stops every reader task of the current room.
    shutdown: Option<watch::Sender<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<M, R> PeerSession<M, R, JsonCodec>
where
    M: TaggedMessage + Serialize + Send + 'static,
    R: Rendezvous,
{
    /// Creates an idle session with a freshly generated peer id.
    pub fn new(rendezvous: R, config: SessionConfig) -> (Self, mpsc::Receiver<SessionEvent<M>>) {
        let local_id = PeerId::generate(&mut rand::rng());
        Self::with_parts(local_id, rendezvous, JsonCodec, config)
    }
}

impl<M, R, C> PeerSession<M, R, C>
where
    M: TaggedMessage + Serialize + Send + 'static,
    R: Rendezvous,
    C: Codec,
{
    /// Creates an idle session with an explicit identity and codec.
    pub fn with_parts(
        local_id: PeerId,
        rendezvous: R,
        codec: C,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent<M>>) {
        let (events, rx) = mpsc::channel(config.event_capacity.max(1));
        let shared = Arc::new(Shared {
            local_id,
            codec,
            config,
            registry: Mutex::new(ConnectionRegistry::new()),
            events,
            seq: AtomicU64::new(1),
        });
        let session = Self {
            shared,
            rendezvous: Arc::new(rendezvous),
            role: None,
            room_code: None,
            shutdown: None,
            tasks: Vec::new(),
        };
        (session, rx)
    }

    pub fn local_id(&self) -> &PeerId {
        &self.shared.local_id
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.room_code.as_ref()
    }

    /// Whether this session is hosting or has joined a room.
    pub fn is_active(&self) -> bool {
        self.role.is_some()
    }

    /// Currently connected peers. For a guest this is just the host.
    pub async fn peers(&self) -> Vec<PeerId> {
        self.shared.registry.lock().await.peers()
    }

    // -----------------------------------------------------------------------
    // Host
    // -----------------------------------------------------------------------

    /// Opens a room and starts accepting guests.
    ///
    /// Reports [`SessionEvent::RoomReady`] on success, otherwise
    /// [`SessionEvent::Error`].
    pub async fn create_room(&mut self) {
        if let Err(e) = self.try_create_room().await {
            error!(error = %e, "could not create room");
            self.shared.emit(SessionEvent::Error(e)).await;
        }
    }

    async fn try_create_room(&mut self) -> Result<(), SessionError> {
        if self.role.is_some() {
            return Err(SessionError::AlreadyInRoom);
        }

        let transport = WebSocketTransport::bind(&self.shared.config.bind_addr).await?;
        let endpoint = endpoint_url(transport.local_addr()?);
        let code = RoomCode::generate(&mut rand::rng());
        self.rendezvous.register(&code, &endpoint).await?;

        let (shutdown, stop) = watch::channel(());
        self.tasks.push(tokio::spawn(accept_loop(transport, Arc::clone(&self.shared), stop)));
        self.shutdown = Some(shutdown);
        self.role = Some(Role::Host);
        self.room_code = Some(code.clone());

        info!(%code, local_id = %self.shared.local_id, %endpoint, "room created");
        self.shared.emit(SessionEvent::RoomReady { code }).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Guest
    // -----------------------------------------------------------------------

    /// Connects to the room registered under `code`.
    ///
    /// Reports [`SessionEvent::Connected`] on success, otherwise
    /// [`SessionEvent::Error`].
    pub async fn join_room(&mut self, code: RoomCode) {
        if let Err(e) = self.try_join_room(code).await {
            error!(error = %e, "could not join room");
            self.shared.emit(SessionEvent::Error(e)).await;
        }
    }

    async fn try_join_room(&mut self, code: RoomCode) -> Result<(), SessionError> {
        if self.role.is_some() {
            return Err(SessionError::AlreadyInRoom);
        }

        let endpoint = self.rendezvous.resolve(&code).await?;
        let conn = tokio::time::timeout(
            self.shared.config.connect_timeout,
            WebSocketConnection::connect(&endpoint),
        )
        .await
        .map_err(|_| SessionError::ConnectTimeout(endpoint.clone()))??;
        let conn = Arc::new(conn);

        let host = match guest_handshake(&conn, &self.shared).await {
            Ok(host) => host,
            Err(e) => {
                let _ = conn.close().await;
                return Err(e);
            }
        };
        self.shared.registry.lock().await.insert(host.clone(), Arc::clone(&conn))?;

        self.role = Some(Role::Guest);
        self.room_code = Some(code.clone());
        info!(%code, %host, local_id = %self.shared.local_id, "joined room");

        // Connected must be queued before the reader can queue host traffic.
        self.shared.emit(SessionEvent::Connected { host: host.clone() }).await;

        let (shutdown, stop) = watch::channel(());
        self.tasks.push(tokio::spawn(serve_host(conn, host, Arc::clone(&self.shared), stop)));
        self.shutdown = Some(shutdown);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Sends `message` to the peers selected by `to`.
    ///
    /// A failed send to one peer is logged and skipped; the peer's reader
    /// will notice the dead connection and report it.
    ///
    /// # Errors
    /// [`SessionError::NotInRoom`] before a room exists, or a protocol
    /// error if the message cannot be encoded.
    pub async fn send(&self, to: &Recipient, message: &M) -> Result<(), SessionError> {
        let Some(role) = self.role else {
            return Err(SessionError::NotInRoom);
        };

        let body = self.shared.codec.encode(message)?;
        let frame = self.shared.frame(Payload::Game(body))?;

        let targets = {
            let registry = self.shared.registry.lock().await;
            match role {
                Role::Host => registry.recipients(to),
                Role::Guest => registry.recipients(&Recipient::All),
            }
        };

        debug!(kind = message.type_name(), ?to, count = targets.len(), "sending");
        for (peer, conn) in targets {
            if let Err(e) = conn.send(&frame).await {
                warn!(%peer, error = %e, "send failed, message dropped");
            }
        }
        Ok(())
    }

    /// Sends to every connected peer.
    pub async fn broadcast(&self, message: &M) -> Result<(), SessionError> {
        self.send(&Recipient::All, message).await
    }

    /// Sends to one peer.
    pub async fn send_to(&self, peer: &PeerId, message: &M) -> Result<(), SessionError> {
        self.send(&Recipient::Peer(peer.clone()), message).await
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Closes every connection, stops background tasks and unregisters the
    /// room. Safe to call more than once; the session can then host or
    /// join again.
    pub async fn cleanup(&mut self) {
        let Some(role) = self.role.take() else {
            return;
        };

        // Drain first so exiting readers do not report departures.
        let peers = self.shared.registry.lock().await.drain();
        self.shutdown.take();
        for task in self.tasks.drain(..) {
            task.abort();
        }

        let goodbye = self
            .shared
            .frame(Payload::System(SystemMessage::Disconnect {
                reason: "session closed".to_string(),
            }))
            .ok();
        for (peer, conn) in peers {
            if let Some(frame) = &goodbye {
                let _ = conn.send(frame).await;
            }
            if let Err(e) = conn.close().await {
                debug!(%peer, error = %e, "close failed");
            }
        }

        if let Some(code) = self.room_code.take() {
            if role.is_host() {
                if let Err(e) = self.rendezvous.unregister(&code).await {
                    warn!(%code, error = %e, "could not unregister room");
                }
            }
        }
        info!(%role, local_id = %self.shared.local_id, "session closed");
    }
}

impl<M, R: Rendezvous, C: Codec> Drop for PeerSession<M, R, C> {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        let hosted = self.role.is_some_and(Role::is_host);
        if let (true, Some(code)) = (hosted, self.room_code.take()) {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let rendezvous = Arc::clone(&self.rendezvous);
                handle.spawn(async move {
                    let _ = rendezvous.unregister(&code).await;
                });
            }
        }
    }
}

impl<M, R: Rendezvous, C: Codec> std::fmt::Debug for PeerSession<M, R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerSession")
            .field("local_id", &self.shared.local_id)
            .field("role", &self.role)
            .field("room_code", &self.room_code)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// A wildcard bind address is not dialable; advertise loopback instead.
fn endpoint_url(addr: SocketAddr) -> String {
    let addr = if addr.ip().is_unspecified() {
        SocketAddr::new(std::net::Ipv4Addr::LOCALHOST.into(), addr.port())
    } else {
        addr
    };
    format!("ws://{addr}")
}

async fn accept_loop<M, C>(
    mut transport: WebSocketTransport,
    shared: Arc<Shared<M, C>>,
    mut stop: watch::Receiver<()>,
) where
    M: TaggedMessage + Send + 'static,
    C: Codec,
{
    loop {
        tokio::select! {
            _ = stop.changed() => break,
            accepted = transport.accept() => match accepted {
                Ok(conn) => {
                    tokio::spawn(serve_guest(conn, Arc::clone(&shared), stop.clone()));
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
        }
    }
    debug!("accept loop stopped");
}

/// Host side of one guest connection, from hello to departure.
async fn serve_guest<M, C>(
    conn: WebSocketConnection,
    shared: Arc<Shared<M, C>>,
    mut stop: watch::Receiver<()>,
) where
    M: TaggedMessage + Send + 'static,
    C: Codec,
{
    let conn = Arc::new(conn);
    let peer = match host_handshake(&conn, &shared).await {
        Ok(peer) => peer,
        Err(e) => {
            warn!(conn_id = %conn.id(), error = %e, "handshake failed");
            let _ = conn.close().await;
            return;
        }
    };

    info!(%peer, "peer joined");
    if !shared.emit(SessionEvent::PeerJoined(peer.clone())).await {
        return;
    }

    read_loop(&conn, &peer, &shared, &mut stop).await;

    let departed = shared.registry.lock().await.remove_if_current(&peer, &conn);
    if departed {
        info!(%peer, "peer left");
        shared.emit(SessionEvent::PeerLeft(peer)).await;
    }
    let _ = conn.close().await;
}

/// Guest side of the host connection after the handshake.
async fn serve_host<M, C>(
    conn: Arc<WebSocketConnection>,
    host: PeerId,
    shared: Arc<Shared<M, C>>,
    mut stop: watch::Receiver<()>,
) where
    M: TaggedMessage + Send + 'static,
    C: Codec,
{
    read_loop(&conn, &host, &shared, &mut stop).await;

    let lost = shared.registry.lock().await.remove_if_current(&host, &conn);
    if lost {
        warn!(%host, "connection to host lost");
        shared.emit(SessionEvent::Disconnected).await;
    }
    let _ = conn.close().await;
}

async fn recv_envelope<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    timeout: std::time::Duration,
) -> Result<Envelope, SessionError> {
    match tokio::time::timeout(timeout, conn.recv()).await {
        Err(_) => Err(SessionError::HandshakeTimeout),
        Ok(Err(e)) => Err(e.into()),
        Ok(Ok(None)) => Err(TransportError::Closed(conn.id()).into()),
        Ok(Ok(Some(bytes))) => Ok(codec.decode(&bytes)?),
    }
}

async fn host_handshake<M, C: Codec>(
    conn: &Arc<WebSocketConnection>,
    shared: &Shared<M, C>,
) -> Result<PeerId, SessionError> {
    let envelope = recv_envelope(conn, &shared.codec, shared.config.handshake_timeout).await?;

    let (version, peer) = match envelope.payload {
        Payload::System(SystemMessage::Hello { version, peer_id }) => (version, peer_id),
        other => {
            debug!(?other, "first frame was not a hello");
            return Err(shared.reject(conn, BAD_HANDSHAKE, "expected hello".into()).await);
        }
    };

    if version != PROTOCOL_VERSION {
        let message = format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}");
        return Err(shared.reject(conn, VERSION_MISMATCH, message).await);
    }

    if peer == shared.local_id {
        return Err(shared.reject(conn, DUPLICATE_PEER, format!("peer id {peer} is taken")).await);
    }

    let taken = shared.registry.lock().await.contains(&peer);
    if taken {
        return Err(shared.reject(conn, DUPLICATE_PEER, format!("peer id {peer} is taken")).await);
    }

    // The welcome must be the first frame the guest sees, so the peer is
    // registered only after it is sent. Broadcasts in between skip it;
    // the game layer catches it up after `PeerJoined`.
    let welcome = SystemMessage::Welcome { host_id: shared.local_id.clone() };
    tokio::time::timeout(shared.config.handshake_timeout, shared.send_system(conn, welcome))
        .await
        .map_err(|_| SessionError::HandshakeTimeout)??;

    let inserted = shared.registry.lock().await.insert(peer.clone(), Arc::clone(conn));
    if let Err(e) = inserted {
        // Another connection with the same id finished first.
        let reason = format!("peer id {peer} is taken");
        if let Err(send) = shared.send_system(conn, SystemMessage::Disconnect { reason }).await {
            debug!(conn_id = %conn.id(), error = %send, "could not deliver disconnect");
        }
        return Err(e);
    }
    Ok(peer)
}

async fn guest_handshake<M, C: Codec>(
    conn: &WebSocketConnection,
    shared: &Shared<M, C>,
) -> Result<PeerId, SessionError> {
    let hello = SystemMessage::Hello {
        version: PROTOCOL_VERSION,
        peer_id: shared.local_id.clone(),
    };
    shared.send_system(conn, hello).await?;

    let envelope = recv_envelope(conn, &shared.codec, shared.config.handshake_timeout).await?;
    match envelope.payload {
        Payload::System(SystemMessage::Welcome { host_id }) => Ok(host_id),
        Payload::System(SystemMessage::Error { code, message }) => {
            Err(SessionError::Rejected { code, message })
        }
        other => Err(ProtocolError::InvalidMessage(format!("expected welcome, got {other:?}")).into()),
    }
}

/// Forwards game messages from `conn` until it closes or the room stops.
async fn read_loop<M, C>(
    conn: &WebSocketConnection,
    from: &PeerId,
    shared: &Shared<M, C>,
    stop: &mut watch::Receiver<()>,
) where
    M: TaggedMessage + Send + 'static,
    C: Codec,
{
    loop {
        let received = tokio::select! {
            _ = stop.changed() => return,
            received = conn.recv() => received,
        };

        let bytes = match received {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(%from, "connection closed");
                return;
            }
            Err(e) => {
                debug!(%from, error = %e, "receive failed");
                return;
            }
        };

        let envelope: Envelope = match shared.codec.decode(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(%from, error = %e, "dropping undecodable frame");
                continue;
            }
        };

        match envelope.payload {
            Payload::Game(data) => match decode_tagged::<M, C>(&shared.codec, &data) {
                Ok(message) => {
                    if let Inbound::Unrecognized(kind) = &message {
                        debug!(%from, %kind, "unrecognized message type");
                    }
                    let event = SessionEvent::Message { from: from.clone(), message };
                    if !shared.emit(event).await {
                        return;
                    }
                }
                Err(e) => {
                    warn!(%from, seq = envelope.seq, error = %e, "dropping malformed game message");
                }
            },
            Payload::System(SystemMessage::Disconnect { reason }) => {
                info!(%from, %reason, "peer disconnected");
                return;
            }
            Payload::System(other) => debug!(%from, ?other, "ignoring system message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_wildcard_becomes_loopback() {
        let addr: SocketAddr = "0.0.0.0:4100".parse().unwrap();
        assert_eq!(endpoint_url(addr), "ws://127.0.0.1:4100");
    }

    #[test]
    fn test_endpoint_url_concrete_address_kept() {
        let addr: SocketAddr = "192.168.1.20:4100".parse().unwrap();
        assert_eq!(endpoint_url(addr), "ws://192.168.1.20:4100");
    }
}
