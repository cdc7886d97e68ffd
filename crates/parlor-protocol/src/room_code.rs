//! Human-readable room codes.
//!
//! A room code is the only thing a guest needs to find a host. It is
//! shown as text, encoded into a QR image, or carried in an invite URL
//! as the `roomCode` query parameter, so it must survive all three
//! unescaped.

use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

const ADJECTIVES: &[&str] = &[
    "brave", "calm", "clever", "cosy", "curly", "dizzy", "eager", "fancy",
    "fluffy", "gentle", "giddy", "happy", "jolly", "kind", "lazy", "lucky",
    "merry", "nimble", "plucky", "proud", "quick", "quiet", "rusty", "shiny",
    "silly", "sleepy", "sneaky", "spicy", "sunny", "swift", "tidy", "witty",
];

const NOUNS: &[&str] = &[
    "badger", "bison", "camel", "cobra", "crane", "ferret", "finch", "fox",
    "gecko", "goose", "heron", "horse", "koala", "lemur", "llama", "lynx",
    "moose", "newt", "otter", "owl", "panda", "parrot", "puffin", "rabbit",
    "raven", "seal", "sloth", "squid", "tiger", "toad", "walrus", "yak",
];

const VERBS: &[&str] = &[
    "bakes", "bounces", "builds", "chases", "climbs", "dances", "dives",
    "dreams", "drifts", "flies", "giggles", "glides", "hops", "hums",
    "juggles", "jumps", "knits", "laughs", "naps", "paints", "plays", "reads",
    "roams", "runs", "sails", "sings", "skates", "sleeps", "swims", "waves",
    "whistles", "wins",
];

fn pick(words: &[&'static str], rng: &mut impl Rng) -> &'static str {
    words.choose(rng).copied().unwrap_or("anon")
}

/// Generates an `adjective-noun-verb` token such as `"fluffy-otter-sings"`.
pub fn human_id(rng: &mut impl Rng) -> String {
    let adjective = pick(ADJECTIVES, rng);
    let noun = pick(NOUNS, rng);
    let verb = pick(VERBS, rng);
    format!("{adjective}-{noun}-{verb}")
}

/// The shared token a guest uses to locate a host's room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Generates a fresh human-readable code.
    pub fn generate(rng: &mut impl Rng) -> Self {
        Self(human_id(rng))
    }

    /// Validates user input. Surrounding whitespace is trimmed; the rest
    /// must be non-empty ASCII letters, digits, `-` or `_`.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let code = input.trim();
        let valid = !code.is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ProtocolError::InvalidRoomCode(input.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    /// Extracts the `roomCode` query parameter from an invite URL.
    ///
    /// Returns `None` when the URL has no such parameter or its value is
    /// not a valid code.
    pub fn from_url(url: &str) -> Option<Self> {
        let without_fragment = url.split('#').next().unwrap_or(url);
        let (_, query) = without_fragment.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "roomCode")
            .and_then(|(_, value)| Self::parse(value).ok())
    }

    /// Builds the shareable invite URL for this code.
    pub fn invite_url(&self, base: &str) -> String {
        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{base}{sep}roomCode={}", self.0)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
