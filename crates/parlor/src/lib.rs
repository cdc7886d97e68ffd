//! # Parlor
//!
//! Peer-to-peer party games. One player hosts a room, the others join it
//! by code, and every process keeps its own copy of the game state in
//! step with the host.
//!
//! This crate ties the layers together:
//!
//! ```text
//! PictionaryClient / GuessWhoClient   ← this crate: one event loop per player
//!     ↕ effects                ↕ words, characters
//! parlor-game (pure rules)     parlor-providers (HTTP + fallbacks)
//!     ↕ messages
//! parlor-session (rooms, handshake, fan-out) → parlor-protocol → parlor-transport
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # async fn run() -> Result<(), ParlorError> {
//! let config = ClientConfig::from_env()?;
//! let mut client = PictionaryClient::new(config.rendezvous(), config)?;
//! client.create_room().await;
//! loop {
//!     match client.step().await {
//!         ClientUpdate::RoomReady(code) => println!("share {code}"),
//!         ClientUpdate::SessionEnded => break,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod guess_who;
mod pictionary;
mod update;

pub use config::{ClientConfig, ConfigError};
pub use error::ParlorError;
pub use guess_who::GuessWhoClient;
pub use pictionary::{PictionaryClient, Wake};
pub use update::ClientUpdate;

pub use parlor_game as game;
pub use parlor_protocol as protocol;
pub use parlor_providers as providers;
pub use parlor_session as session;

/// Common imports for building a front-end.
pub mod prelude {
    pub use crate::{
        ClientConfig, ClientUpdate, GuessWhoClient, ParlorError, PictionaryClient,
    };
    pub use parlor_game::Phase;
    pub use parlor_game::guess_who::{Character, GuessWhoPhase, GuessWhoState};
    pub use parlor_game::pictionary::{DrawingEvent, GameState, Player, Point};
    pub use parlor_protocol::{PeerId, Role, RoomCode};
    pub use parlor_session::{DirectoryRendezvous, LocalRendezvous, Rendezvous};
}
