//! Pictionary: one drawer, everyone else guesses, the host keeps time.
//!
//! - [`GameState`]: the local store and its operations
//! - [`PictionaryMessage`]: the wire schema
//! - [`Pictionary`]: the [`GameRules`](crate::GameRules) implementation
//! - [`RoundHost`]: host-only round driving, returns [`Effect`]s
//! - [`guest_dispatch`]: guest-side message handling
//! - [`select_next_drawer`], [`is_correct_guess`]: round scheduling

mod host;
mod local;
mod message;
mod rules;
mod scheduler;
mod state;
mod types;

pub use host::RoundHost;
pub use local::{draw, introduce, rename, toggle_ready};
pub use message::PictionaryMessage;
pub use rules::{Effect, Pictionary, guest_dispatch};
pub use scheduler::{
    is_correct_guess, normalize_guess, score_correct_guess, select_next_drawer,
};
pub use state::GameState;
pub use types::{DrawingEvent, Player, Point};
