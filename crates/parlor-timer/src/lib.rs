//! Timers for Parlor's single-threaded client loops.
//!
//! - [`Countdown`]: the one-second round clock. Ticks while running,
//!   stops itself at zero and reports expiry.
//! - [`Delay`]: a cancellable one-shot, used for the pause between a
//!   round ending and the scoreboard appearing.
//!
//! Neither spawns a task. Both expose a future that pends forever while
//! idle, so they sit directly in a client's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = events.recv() => { /* peer traffic */ }
//!         tick = countdown.tick() => {
//!             if tick.expired { /* round timed out */ }
//!         }
//!         due = scoreboard.fired() => { /* show scoreboard */ }
//!     }
//! }
//! ```
//!
//! Both futures are cancel-safe: state only changes after the sleep
//! completes, so losing a `select!` race never drops a tick.

mod countdown;
mod delay;

pub use countdown::{Countdown, Tick};
pub use delay::Delay;
