//! Unified error type for Parlor.

use parlor_game::GameError;
use parlor_protocol::ProtocolError;
use parlor_providers::ProviderError;
use parlor_session::SessionError;
use parlor_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps every crate-specific error.
///
/// Client actions return this so callers need a single `?`-compatible
/// type. Each variant converts from its sub-crate error.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Room setup, handshake or send failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An action that the current phase does not allow.
    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A host-only action was attempted by a guest or outside a room.
    #[error("only the host can {0}")]
    NotHost(&'static str),

    /// A round needs two or more players, all of them ready.
    #[error("waiting for players: need at least two, all ready")]
    PlayersNotReady,

    /// The action needs an opponent in the room.
    #[error("no opponent has joined yet")]
    NoOpponent,
}
