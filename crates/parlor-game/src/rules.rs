//! The `GameRules` trait: one message, one transition.

use parlor_protocol::{Inbound, PeerId, TaggedMessage};
use serde::Serialize;

/// The transition contract shared by every game.
///
/// Each game defines a closed message union and a state type; `apply`
/// maps (state, message) to the next state. Guests call it for every
/// message the host sends; the host calls it for its own messages and,
/// after [`validate`](GameRules::validate), for guest messages.
pub trait GameRules {
    /// The full local game state.
    type State: Clone + Default;

    /// The closed set of peer messages.
    type Message: TaggedMessage + Serialize + Clone + std::fmt::Debug;

    /// Applies exactly one message to the state.
    ///
    /// Total: any message applied to any state leaves the state
    /// consistent. Messages that make no sense in the current state are
    /// no-ops.
    fn apply(state: &mut Self::State, msg: &Self::Message);

    /// Host-side guard for messages received from `sender`.
    ///
    /// Called before `apply`. Rejected messages are logged and dropped.
    /// Default: accept all.
    fn validate(
        _state: &Self::State,
        _sender: &PeerId,
        _msg: &Self::Message,
    ) -> Result<(), String> {
        Ok(())
    }

    /// By-value form of [`apply`](GameRules::apply).
    fn reduce(mut state: Self::State, msg: &Self::Message) -> Self::State {
        Self::apply(&mut state, msg);
        state
    }

    /// Applies a decoded inbound message and reports whether its type was
    /// recognized.
    ///
    /// Unrecognized types are not errors: they come from newer clients
    /// and are ignored.
    fn dispatch(state: &mut Self::State, inbound: &Inbound<Self::Message>) -> bool {
        match inbound {
            Inbound::Known(msg) => {
                tracing::debug!(kind = msg.type_name(), "applying peer message");
                Self::apply(state, msg);
                true
            }
            Inbound::Unrecognized(kind) => {
                tracing::debug!(%kind, "ignoring unrecognized peer message");
                false
            }
        }
    }
}

/// Result of dispatching one inbound message: whether its type was
/// known, and what the client loop must do next.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<E> {
    /// `false` if the message type is not known to this build.
    pub recognized: bool,
    pub effects: Vec<E>,
}

impl<E> Outcome<E> {
    pub(crate) fn unrecognized() -> Self {
        Self {
            recognized: false,
            effects: Vec::new(),
        }
    }

    pub(crate) fn handled(effects: Vec<E>) -> Self {
        Self {
            recognized: true,
            effects,
        }
    }
}
