//! Game rules for Parlor: what the peers say to each other and what each
//! message does to local state.
//!
//! Everything here is pure. No sockets, no clocks, no tasks. State is
//! changed only through explicit operations and the single
//! [`GameRules::apply`] transition per message, which makes every rule
//! testable without a network.
//!
//! # Key types
//!
//! - [`GameRules`]: the message → state transition contract
//! - [`pictionary`]: players, drawing log, drawer selection, round host
//! - [`guess_who`]: board, secrets, cross-outs, dealing
//! - [`PictionaryConfig`] / [`GuessWhoConfig`]: tunables
//! - [`Phase`]: the Pictionary round state machine
//!
//! # Authority
//!
//! The host is the single writer of round-affecting transitions. On the
//! host, inbound guest messages pass through [`GameRules::validate`]
//! before they are applied; host-originated messages are applied locally
//! and broadcast, so every guest replays the same sequence and converges
//! on the host's state.

mod config;
mod error;
mod rules;

pub mod guess_who;
pub mod pictionary;

pub use config::{GuessWhoConfig, Phase, PictionaryConfig};
pub use error::GameError;
pub use rules::{GameRules, Outcome};
