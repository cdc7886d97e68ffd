//! Guess-Who: two players, two boards, two secret characters.
//!
//! The host deals once the guest announces it is ready: each side gets
//! its own shuffled copy of the same characters and a different secret.
//! After that the only traffic is cross-out sync and name changes; the
//! actual questions are asked out loud.

mod deal;
mod message;
mod state;

pub use deal::{Deal, deal};
pub use message::{Character, GuessWhoMessage};
pub use state::{Effect, GuessWho, GuessWhoPhase, GuessWhoState, guest_dispatch, host_dispatch};
