//! Character providers and the board-building pipeline for Guess-Who.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use parlor_game::guess_who::Character;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::ProviderError;
use crate::http::get_json;

/// A source of board faces.
#[async_trait]
pub trait CharacterProvider: Send + Sync {
    /// Display name; also the key used to enable the provider.
    fn name(&self) -> &str;

    /// Fetches every character this source offers. Ids are provisional.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the source cannot be reached or
    /// answers with an unexpected body.
    async fn fetch_characters(&self) -> Result<Vec<Character>, ProviderError>;
}

fn indexed(named: impl IntoIterator<Item = (String, String)>) -> Vec<Character> {
    named
        .into_iter()
        .zip(0u32..)
        .map(|((name, image), id)| Character { id, name, image })
        .collect()
}

// ---------------------------------------------------------------------------
// Superheroes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Superhero {
    name: String,
    #[serde(default)]
    images: SuperheroImages,
}

#[derive(Debug, Default, Deserialize)]
struct SuperheroImages {
    sm: Option<String>,
}

/// Heroes from the akabab superhero API, small portraits only.
#[derive(Debug, Clone)]
pub struct SuperheroProvider {
    http: reqwest::Client,
}

impl SuperheroProvider {
    pub const NAME: &'static str = "Superheroes";
    const URL: &'static str = "https://akabab.github.io/superhero-api/api/all.json";

    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CharacterProvider for SuperheroProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_characters(&self) -> Result<Vec<Character>, ProviderError> {
        let heroes: Vec<Superhero> = get_json(&self.http, Self::URL).await?;
        Ok(indexed(
            heroes
                .into_iter()
                .filter_map(|h| h.images.sm.map(|image| (h.name, image))),
        ))
    }
}

// ---------------------------------------------------------------------------
// Pokemon
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PokemonList {
    results: Vec<PokemonRef>,
}

#[derive(Debug, Deserialize)]
struct PokemonRef {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PokemonDetail {
    name: String,
    sprites: PokemonSprites,
}

#[derive(Debug, Deserialize)]
struct PokemonSprites {
    front_default: Option<String>,
    #[serde(default)]
    other: PokemonOtherSprites,
}

#[derive(Debug, Default, Deserialize)]
struct PokemonOtherSprites {
    #[serde(rename = "official-artwork", default)]
    official_artwork: Option<PokemonArtwork>,
}

#[derive(Debug, Deserialize)]
struct PokemonArtwork {
    front_default: Option<String>,
}

impl PokemonDetail {
    fn image(self) -> Option<(String, String)> {
        let artwork = self.sprites.other.official_artwork.and_then(|a| a.front_default);
        let image = artwork.or(self.sprites.front_default)?;
        Some((capitalize(&self.name), image))
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First-generation Pokemon from PokeAPI, official artwork preferred.
#[derive(Debug, Clone)]
pub struct PokemonProvider {
    http: reqwest::Client,
}

impl PokemonProvider {
    pub const NAME: &'static str = "Pokemon";
    const LIST_URL: &'static str = "https://pokeapi.co/api/v2/pokemon?limit=151&offset=0";
    /// Detail lookups are one request each; only this many are made.
    const DETAIL_LIMIT: usize = 50;

    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CharacterProvider for PokemonProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_characters(&self) -> Result<Vec<Character>, ProviderError> {
        let list: PokemonList = get_json(&self.http, Self::LIST_URL).await?;

        let lookups = list.results.into_iter().take(Self::DETAIL_LIMIT).map(|entry| async move {
            match get_json::<PokemonDetail>(&self.http, &entry.url).await {
                Ok(detail) => detail.image(),
                Err(e) => {
                    debug!(pokemon = %entry.name, error = %e, "skipping pokemon");
                    None
                }
            }
        });

        Ok(indexed(join_all(lookups).await.into_iter().flatten()))
    }
}

// ---------------------------------------------------------------------------
// Rick & Morty
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RickAndMortyPage {
    results: Vec<RickAndMortyCharacter>,
}

#[derive(Debug, Deserialize)]
struct RickAndMortyCharacter {
    name: String,
    image: String,
}

/// First page of the Rick and Morty API.
#[derive(Debug, Clone)]
pub struct RickAndMortyProvider {
    http: reqwest::Client,
}

impl RickAndMortyProvider {
    pub const NAME: &'static str = "Rick & Morty";
    const URL: &'static str = "https://rickandmortyapi.com/api/character";

    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CharacterProvider for RickAndMortyProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_characters(&self) -> Result<Vec<Character>, ProviderError> {
        let page: RickAndMortyPage = get_json(&self.http, Self::URL).await?;
        Ok(indexed(page.results.into_iter().map(|c| (c.name, c.image))))
    }
}

// ---------------------------------------------------------------------------
// Avatar
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvatarCharacter {
    name: String,
    photo_url: Option<String>,
}

/// Characters from the Last Airbender API that have a photo.
#[derive(Debug, Clone)]
pub struct AvatarProvider {
    http: reqwest::Client,
}

impl AvatarProvider {
    pub const NAME: &'static str = "Avatar";
    const URL: &'static str = "https://last-airbender-api.fly.dev/api/v1/characters";

    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CharacterProvider for AvatarProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_characters(&self) -> Result<Vec<Character>, ProviderError> {
        let all: Vec<AvatarCharacter> = get_json(&self.http, Self::URL).await?;
        Ok(indexed(
            all.into_iter().filter_map(|c| c.photo_url.map(|image| (c.name, image))),
        ))
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

const FALLBACK_NAMES: &[&str] = &[
    "Alex", "Bernard", "Claire", "David", "Eric", "Frans", "George", "Herman", "Joe", "Maria",
    "Max", "Paul", "Peter", "Philip", "Richard", "Robert", "Sam", "Susan", "Tom", "Anne",
    "Bill", "Charles", "Anita", "Alfred",
];

/// The roster used when every source fails.
pub fn fallback_roster() -> Vec<Character> {
    indexed(FALLBACK_NAMES.iter().map(|name| {
        (
            (*name).to_string(),
            format!("https://api.dicebear.com/9.x/personas/svg?seed={name}"),
        )
    }))
}

/// Mixes `sources` into one board of at most `board_size` faces.
///
/// Each source contributes `board_size / n` faces, the first
/// `board_size % n` sources one more. The result is shuffled and ids are
/// reassigned `0..len` so they are unique across sources.
pub fn balance(
    sources: Vec<Vec<Character>>,
    board_size: usize,
    rng: &mut impl Rng,
) -> Vec<Character> {
    if sources.is_empty() {
        return Vec::new();
    }

    let per_source = board_size / sources.len();
    let remainder = board_size % sources.len();

    let mut board = Vec::with_capacity(board_size);
    for (i, mut faces) in sources.into_iter().enumerate() {
        faces.shuffle(rng);
        let take = per_source + usize::from(i < remainder);
        board.extend(faces.into_iter().take(take));
    }
    board.shuffle(rng);

    for (character, id) in board.iter_mut().zip(0u32..) {
        character.id = id;
    }
    board
}

/// Builds the Guess-Who board from the enabled sources.
#[derive(Clone)]
pub struct CharacterPool {
    providers: Vec<Arc<dyn CharacterProvider>>,
    board_size: usize,
}

impl CharacterPool {
    pub fn new(providers: Vec<Arc<dyn CharacterProvider>>, board_size: usize) -> Self {
        Self { providers, board_size }
    }

    /// The four built-in sources sharing one HTTP client.
    pub fn with_defaults(http: reqwest::Client, board_size: usize) -> Self {
        Self::new(
            vec![
                Arc::new(SuperheroProvider::new(http.clone())),
                Arc::new(PokemonProvider::new(http.clone())),
                Arc::new(RickAndMortyProvider::new(http.clone())),
                Arc::new(AvatarProvider::new(http)),
            ],
            board_size,
        )
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Fetches every enabled source (all of them when `enabled` is empty)
    /// and balances the result into one board.
    ///
    /// Failing sources are skipped. If nothing at all comes back, the
    /// built-in [`fallback_roster`] is used instead.
    pub async fn fetch(&self, enabled: &[String]) -> Vec<Character> {
        let by_name: HashMap<&str, &Arc<dyn CharacterProvider>> =
            self.providers.iter().map(|p| (p.name(), p)).collect();

        let selected: Vec<&str> = if enabled.is_empty() {
            self.names()
        } else {
            enabled.iter().map(String::as_str).collect()
        };

        let mut sources = Vec::new();
        for name in selected {
            let Some(provider) = by_name.get(name) else {
                warn!(provider = name, "character provider not registered");
                continue;
            };
            match provider.fetch_characters().await {
                Ok(faces) if !faces.is_empty() => {
                    debug!(provider = name, count = faces.len(), "fetched characters");
                    sources.push(faces);
                }
                Ok(_) => debug!(provider = name, "source returned no characters"),
                Err(e) => warn!(provider = name, error = %e, "character fetch failed"),
            }
        }

        if sources.is_empty() {
            info!("all character sources failed, using fallback roster");
            sources.push(fallback_roster());
        }

        balance(sources, self.board_size, &mut rand::rng())
    }
}

impl std::fmt::Debug for CharacterPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterPool")
            .field("providers", &self.names())
            .field("board_size", &self.board_size)
            .finish()
    }
}
