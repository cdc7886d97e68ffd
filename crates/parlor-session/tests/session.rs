//! End-to-end session tests over real loopback sockets.

use std::time::Duration;

use parlor_protocol::{
    Codec, Envelope, Inbound, JsonCodec, Payload, PeerId, Recipient, RoomCode, SystemMessage,
    TaggedMessage,
};
use parlor_session::{
    DUPLICATE_PEER, LocalRendezvous, PeerSession, Rendezvous, SessionConfig, SessionError,
    SessionEvent, VERSION_MISMATCH,
};
use parlor_transport::{Connection, WebSocketConnection};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Chat {
    Say { text: String },
    Ping,
}

impl TaggedMessage for Chat {
    const TYPES: &'static [&'static str] = &["say", "ping"];

    fn type_name(&self) -> &'static str {
        match self {
            Chat::Say { .. } => "say",
            Chat::Ping => "ping",
        }
    }
}

type Session = PeerSession<Chat, LocalRendezvous>;
type Events = mpsc::Receiver<SessionEvent<Chat>>;

fn say(text: &str) -> Chat {
    Chat::Say { text: text.to_string() }
}

async fn next_event(rx: &mut Events) -> SessionEvent<Chat> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event channel closed")
}

async fn host(rv: &LocalRendezvous) -> (Session, Events, RoomCode) {
    let (mut session, mut rx) = Session::new(rv.clone(), SessionConfig::default());
    session.create_room().await;
    match next_event(&mut rx).await {
        SessionEvent::RoomReady { code } => (session, rx, code),
        other => panic!("expected RoomReady, got {other:?}"),
    }
}

async fn guest(rv: &LocalRendezvous, code: &RoomCode, id: &str) -> (Session, Events) {
    let (mut session, mut rx) = Session::with_parts(
        PeerId::new(id),
        rv.clone(),
        JsonCodec,
        SessionConfig::default(),
    );
    session.join_room(code.clone()).await;
    match next_event(&mut rx).await {
        SessionEvent::Connected { .. } => (session, rx),
        other => panic!("expected Connected, got {other:?}"),
    }
}

async fn expect_joined(rx: &mut Events, id: &str) {
    match next_event(rx).await {
        SessionEvent::PeerJoined(peer) => assert_eq!(peer.as_str(), id),
        other => panic!("expected PeerJoined({id}), got {other:?}"),
    }
}

async fn expect_message(rx: &mut Events) -> (PeerId, Inbound<Chat>) {
    match next_event(rx).await {
        SessionEvent::Message { from, message } => (from, message),
        other => panic!("expected Message, got {other:?}"),
    }
}

// =========================================================================
// Room setup
// =========================================================================

#[tokio::test]
async fn test_create_room_registers_code() {
    let rv = LocalRendezvous::new();
    let (session, _rx, code) = host(&rv).await;

    assert_eq!(session.room_code(), Some(&code));
    assert!(session.role().is_some_and(|r| r.is_host()));
    assert!(rv.resolve(&code).await.unwrap().starts_with("ws://127.0.0.1:"));
}

#[tokio::test]
async fn test_join_room_reports_host_id() {
    let rv = LocalRendezvous::new();
    let (host, mut host_rx, code) = host(&rv).await;

    let (mut guest, mut guest_rx) = Session::with_parts(
        PeerId::new("guest-one"),
        rv.clone(),
        JsonCodec,
        SessionConfig::default(),
    );
    guest.join_room(code).await;

    match next_event(&mut guest_rx).await {
        SessionEvent::Connected { host: host_id } => assert_eq!(&host_id, host.local_id()),
        other => panic!("expected Connected, got {other:?}"),
    }
    expect_joined(&mut host_rx, "guest-one").await;
    assert_eq!(host.peers().await, vec![PeerId::new("guest-one")]);
}

#[tokio::test]
async fn test_join_unknown_room_reports_not_found() {
    let rv = LocalRendezvous::new();
    let (mut session, mut rx) = Session::new(rv, SessionConfig::default());

    session.join_room(RoomCode::parse("no-such-room").unwrap()).await;

    assert!(matches!(
        next_event(&mut rx).await,
        SessionEvent::Error(SessionError::RoomNotFound(_))
    ));
    assert!(!session.is_active());
}

#[tokio::test]
async fn test_create_room_twice_reports_already_in_room() {
    let rv = LocalRendezvous::new();
    let (mut session, mut rx, _code) = host(&rv).await;

    session.create_room().await;

    assert!(matches!(
        next_event(&mut rx).await,
        SessionEvent::Error(SessionError::AlreadyInRoom)
    ));
}

#[tokio::test]
async fn test_join_duplicate_peer_id_rejected() {
    let rv = LocalRendezvous::new();
    let (_host, mut host_rx, code) = host(&rv).await;
    let (_first, _first_rx) = guest(&rv, &code, "twin").await;
    expect_joined(&mut host_rx, "twin").await;

    let (mut second, mut second_rx) = Session::with_parts(
        PeerId::new("twin"),
        rv.clone(),
        JsonCodec,
        SessionConfig::default(),
    );
    second.join_room(code).await;

    match next_event(&mut second_rx).await {
        SessionEvent::Error(SessionError::Rejected { code, .. }) => assert_eq!(code, DUPLICATE_PEER),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_concurrent_duplicate_peer_id_admits_one() {
    let rv = LocalRendezvous::new();
    let (host, mut host_rx, code) = host(&rv).await;
    let twin = || {
        Session::with_parts(PeerId::new("twin"), rv.clone(), JsonCodec, SessionConfig::default())
    };
    let (mut a, _a_rx) = twin();
    let (mut b, _b_rx) = twin();

    tokio::join!(a.join_room(code.clone()), b.join_room(code.clone()));

    expect_joined(&mut host_rx, "twin").await;
    let extra = tokio::time::timeout(Duration::from_millis(300), host_rx.recv()).await;
    assert!(extra.is_err(), "unexpected host event: {extra:?}");
    assert_eq!(host.peers().await, vec![PeerId::new("twin")]);
}

#[tokio::test]
async fn test_pending_handshake_does_not_block_broadcast() {
    let rv = LocalRendezvous::new();
    let (host, mut host_rx, code) = host(&rv).await;
    let (_guest, mut guest_rx) = guest(&rv, &code, "steady").await;
    expect_joined(&mut host_rx, "steady").await;

    // Says hello, then never reads the welcome.
    let endpoint = rv.resolve(&code).await.unwrap();
    let silent = WebSocketConnection::connect(&endpoint).await.unwrap();
    let hello = Envelope::new(
        1,
        Payload::System(SystemMessage::Hello {
            version: parlor_protocol::PROTOCOL_VERSION,
            peer_id: PeerId::new("silent"),
        }),
    );
    silent.send(&JsonCodec.encode(&hello).unwrap()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), host.broadcast(&say("still here")))
        .await
        .expect("broadcast stalled")
        .unwrap();
    let (_, message) = expect_message(&mut guest_rx).await;
    assert_eq!(message, Inbound::Known(say("still here")));
}

#[tokio::test]
async fn test_handshake_wrong_version_rejected() {
    let rv = LocalRendezvous::new();
    let (_host, _host_rx, code) = host(&rv).await;
    let endpoint = rv.resolve(&code).await.unwrap();

    let conn = WebSocketConnection::connect(&endpoint).await.unwrap();
    let hello = Envelope::new(
        1,
        Payload::System(SystemMessage::Hello {
            version: 99,
            peer_id: PeerId::new("time-traveller"),
        }),
    );
    conn.send(&JsonCodec.encode(&hello).unwrap()).await.unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(5), conn.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let reply: Envelope = JsonCodec.decode(&reply).unwrap();
    assert!(matches!(
        reply.payload,
        Payload::System(SystemMessage::Error { code, .. }) if code == VERSION_MISMATCH
    ));
}

// =========================================================================
// Messaging
// =========================================================================

#[tokio::test]
async fn test_guest_broadcast_reaches_host_with_sender() {
    let rv = LocalRendezvous::new();
    let (_host, mut host_rx, code) = host(&rv).await;
    let (guest, _guest_rx) = guest(&rv, &code, "alice").await;
    expect_joined(&mut host_rx, "alice").await;

    guest.broadcast(&say("hi")).await.unwrap();

    let (from, message) = expect_message(&mut host_rx).await;
    assert_eq!(from.as_str(), "alice");
    assert_eq!(message, Inbound::Known(say("hi")));
}

#[tokio::test]
async fn test_host_all_except_skips_excluded_peer() {
    let rv = LocalRendezvous::new();
    let (host, mut host_rx, code) = host(&rv).await;
    let (_alice, mut alice_rx) = guest(&rv, &code, "alice").await;
    expect_joined(&mut host_rx, "alice").await;
    let (_bob, mut bob_rx) = guest(&rv, &code, "bob").await;
    expect_joined(&mut host_rx, "bob").await;

    host.send(&Recipient::AllExcept(PeerId::new("alice")), &say("for bob"))
        .await
        .unwrap();
    host.broadcast(&Chat::Ping).await.unwrap();

    // Alice's first message is the broadcast; the targeted one never came.
    assert_eq!(expect_message(&mut alice_rx).await.1, Inbound::Known(Chat::Ping));
    assert_eq!(expect_message(&mut bob_rx).await.1, Inbound::Known(say("for bob")));
    assert_eq!(expect_message(&mut bob_rx).await.1, Inbound::Known(Chat::Ping));
}

#[tokio::test]
async fn test_send_to_single_peer() {
    let rv = LocalRendezvous::new();
    let (host, mut host_rx, code) = host(&rv).await;
    let (_alice, mut alice_rx) = guest(&rv, &code, "alice").await;
    expect_joined(&mut host_rx, "alice").await;

    host.send_to(&PeerId::new("alice"), &say("psst")).await.unwrap();

    assert_eq!(expect_message(&mut alice_rx).await.1, Inbound::Known(say("psst")));
}

#[tokio::test]
async fn test_unknown_message_type_arrives_unrecognized() {
    let rv = LocalRendezvous::new();
    let (_host, mut host_rx, code) = host(&rv).await;
    let endpoint = rv.resolve(&code).await.unwrap();

    let conn = WebSocketConnection::connect(&endpoint).await.unwrap();
    let hello = Envelope::new(
        1,
        Payload::System(SystemMessage::Hello {
            version: parlor_protocol::PROTOCOL_VERSION,
            peer_id: PeerId::new("future-client"),
        }),
    );
    conn.send(&JsonCodec.encode(&hello).unwrap()).await.unwrap();
    let _welcome = conn.recv().await.unwrap();
    expect_joined(&mut host_rx, "future-client").await;

    // Garbage first: dropped inside the session, never surfaced.
    let garbage = Envelope::new(2, Payload::Game(br#"{"text":"no tag"}"#.to_vec()));
    conn.send(&JsonCodec.encode(&garbage).unwrap()).await.unwrap();
    let unknown = Envelope::new(3, Payload::Game(br#"{"type":"teleport"}"#.to_vec()));
    conn.send(&JsonCodec.encode(&unknown).unwrap()).await.unwrap();

    let (_, message) = expect_message(&mut host_rx).await;
    assert_eq!(message, Inbound::Unrecognized("teleport".into()));
}

#[tokio::test]
async fn test_send_before_room_returns_not_in_room() {
    let (session, _rx) = Session::new(LocalRendezvous::new(), SessionConfig::default());
    assert!(matches!(
        session.broadcast(&Chat::Ping).await,
        Err(SessionError::NotInRoom)
    ));
}

// =========================================================================
// Teardown
// =========================================================================

#[tokio::test]
async fn test_guest_leaving_reports_peer_left() {
    let rv = LocalRendezvous::new();
    let (host, mut host_rx, code) = host(&rv).await;
    let (mut alice, _alice_rx) = guest(&rv, &code, "alice").await;
    expect_joined(&mut host_rx, "alice").await;

    alice.cleanup().await;

    match next_event(&mut host_rx).await {
        SessionEvent::PeerLeft(peer) => assert_eq!(peer.as_str(), "alice"),
        other => panic!("expected PeerLeft, got {other:?}"),
    }
    assert!(host.peers().await.is_empty());
}

#[tokio::test]
async fn test_host_cleanup_disconnects_guest_and_unregisters() {
    let rv = LocalRendezvous::new();
    let (mut host, mut host_rx, code) = host(&rv).await;
    let (_alice, mut alice_rx) = guest(&rv, &code, "alice").await;
    expect_joined(&mut host_rx, "alice").await;

    host.cleanup().await;

    assert!(matches!(next_event(&mut alice_rx).await, SessionEvent::Disconnected));
    assert!(rv.is_empty());
    assert!(!host.is_active());
}

#[tokio::test]
async fn test_cleanup_twice_is_noop() {
    let rv = LocalRendezvous::new();
    let (mut host, _rx, _code) = host(&rv).await;

    host.cleanup().await;
    host.cleanup().await;

    assert!(host.room_code().is_none());
}

#[tokio::test]
async fn test_cleanup_then_host_again() {
    let rv = LocalRendezvous::new();
    let (mut session, mut rx, _first) = host(&rv).await;
    session.cleanup().await;

    session.create_room().await;

    match next_event(&mut rx).await {
        SessionEvent::RoomReady { code } => {
            assert_eq!(session.room_code(), Some(&code));
            assert!(rv.resolve(&code).await.is_ok());
        }
        other => panic!("expected RoomReady, got {other:?}"),
    }
}
