//! Word and character sources for Parlor.
//!
//! Both games pull content from public web APIs. Those APIs are slow,
//! rate limited and sometimes gone, so nothing here is allowed to fail
//! a game: every provider has a local fallback and the two pipelines,
//! [`WordPicker`] and [`CharacterPool`], turn any error into a default.
//!
//! # Key types
//!
//! - [`WordProvider`] / [`CharacterProvider`]: swappable async sources
//! - [`WordPicker`]: one word for a Pictionary round
//! - [`CharacterPool`]: a balanced, re-indexed Guess-Who board

mod characters;
mod error;
pub mod http;
mod words;

pub use characters::{
    AvatarProvider, CharacterPool, CharacterProvider, PokemonProvider, RickAndMortyProvider,
    SuperheroProvider, balance, fallback_roster,
};
pub use error::ProviderError;
pub use words::{
    EMPTY_RESULT_WORD, FAILED_FETCH_WORD, HerokuWordProvider, KushWordProvider,
    NO_PROVIDER_WORD, OfflineWordProvider, RandomWordsApiProvider, UNKNOWN_PROVIDER_WORD,
    WordPicker, WordProvider,
};
