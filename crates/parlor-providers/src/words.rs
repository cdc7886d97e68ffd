//! Word providers and the pick-one-word pipeline used to start a round.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::ProviderError;
use crate::http::get_json;

/// Word used when no provider is enabled.
pub const NO_PROVIDER_WORD: &str = "cat";
/// Word used when the chosen provider name is not registered.
pub const UNKNOWN_PROVIDER_WORD: &str = "dog";
/// Word used when the provider returned nothing.
pub const EMPTY_RESULT_WORD: &str = "tree";
/// Word used when the provider failed.
pub const FAILED_FETCH_WORD: &str = "house";

/// A source of words to draw.
#[async_trait]
pub trait WordProvider: Send + Sync {
    /// Display name; also the key used to enable the provider.
    fn name(&self) -> &str;

    /// Fetches up to `count` lower-case words.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the source cannot be reached and
    /// has no fallback of its own.
    async fn fetch_words(&self, count: usize) -> Result<Vec<String>, ProviderError>;
}

/// Draws `count` words from `list`, with replacement.
fn sample(list: &[&str], count: usize, rng: &mut impl Rng) -> Vec<String> {
    (0..count)
        .filter_map(|_| list.choose(rng).map(|w| (*w).to_string()))
        .collect()
}

fn noun_or_verb() -> &'static str {
    if rand::rng().random_bool(0.5) { "noun" } else { "verb" }
}

/// Runs a remote fetch and swaps in `fallback` on error or empty result.
fn or_fallback(
    provider: &str,
    result: Result<Vec<String>, ProviderError>,
    fallback: &[&str],
    count: usize,
) -> Vec<String> {
    match result {
        Ok(words) if !words.is_empty() => words,
        Ok(_) => {
            debug!(provider, "no words returned, using fallback list");
            sample(fallback, count, &mut rand::rng())
        }
        Err(e) => {
            warn!(provider, error = %e, "word fetch failed, using fallback list");
            sample(fallback, count, &mut rand::rng())
        }
    }
}

/// Upstream word entries come either as bare strings or as `{ "word": .. }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WordItem {
    Plain(String),
    Entry { word: String },
}

impl WordItem {
    fn into_word(self) -> Option<String> {
        let word = match self {
            Self::Plain(w) | Self::Entry { word: w } => w.trim().to_lowercase(),
        };
        (!word.is_empty()).then_some(word)
    }
}

fn collect_words(items: Vec<WordItem>) -> Vec<String> {
    items.into_iter().filter_map(WordItem::into_word).collect()
}

// ---------------------------------------------------------------------------
// Offline
// ---------------------------------------------------------------------------

const OFFLINE_NOUNS: &[&str] = &[
    "anchor", "balloon", "bridge", "camera", "candle", "castle", "cloud", "dragon", "island",
    "kite", "ladder", "lighthouse", "mountain", "octopus", "pencil", "pizza", "robot", "rocket",
    "snowman", "spider", "sunflower", "telescope", "tornado", "umbrella", "volcano", "whale",
];
const OFFLINE_VERBS: &[&str] = &[
    "climb", "dance", "dig", "dive", "fish", "juggle", "knit", "paint", "skate", "sleep",
    "sneeze", "swim", "throw", "whisper", "yawn",
];
const OFFLINE_ADJECTIVES: &[&str] = &[
    "angry", "fluffy", "frozen", "giant", "hairy", "haunted", "sleepy", "spicy", "tiny", "wet",
];

/// Built-in vocabulary of nouns, verbs and adjectives. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineWordProvider;

impl OfflineWordProvider {
    pub const NAME: &'static str = "Offline";

    fn words(count: usize) -> Vec<String> {
        let mut rng = rand::rng();
        (0..count)
            .filter_map(|_| {
                let list = match rng.random_range(0..3) {
                    0 => OFFLINE_NOUNS,
                    1 => OFFLINE_VERBS,
                    _ => OFFLINE_ADJECTIVES,
                };
                list.choose(&mut rng).map(|w| (*w).to_string())
            })
            .collect()
    }
}

#[async_trait]
impl WordProvider for OfflineWordProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_words(&self, count: usize) -> Result<Vec<String>, ProviderError> {
        Ok(Self::words(count))
    }
}

// ---------------------------------------------------------------------------
// HTTP providers
// ---------------------------------------------------------------------------

/// One word per request from `random-words-api.vercel.app`.
#[derive(Debug, Clone)]
pub struct RandomWordsApiProvider {
    http: reqwest::Client,
    base_url: String,
}

impl RandomWordsApiProvider {
    pub const NAME: &'static str = "Random Words API";
    const BASE_URL: &'static str = "https://random-words-api.vercel.app";
    const FALLBACK: &'static [&'static str] = &[
        "cat", "dog", "tree", "house", "car", "phone", "book", "sun", "moon", "star", "run",
        "jump", "swim", "fly", "dance", "sing", "read", "write", "draw", "paint",
    ];

    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Fetches words one at a time; a failed request is skipped.
    async fn fetch_remote(&self, count: usize) -> Result<Vec<String>, ProviderError> {
        let mut words = Vec::with_capacity(count);
        for i in 0..count {
            let url = format!("{}/{}", self.base_url, noun_or_verb());
            match get_json::<Vec<WordItem>>(&self.http, &url).await {
                Ok(items) => words.extend(collect_words(items).into_iter().take(1)),
                Err(e) => debug!(provider = Self::NAME, attempt = i + 1, error = %e, "skipping word"),
            }
        }
        Ok(words)
    }
}

#[async_trait]
impl WordProvider for RandomWordsApiProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_words(&self, count: usize) -> Result<Vec<String>, ProviderError> {
        let result = self.fetch_remote(count).await;
        Ok(or_fallback(Self::NAME, result, Self::FALLBACK, count))
    }
}

/// Batched noun or verb lists from `random-words-api.kushcreates.com`.
#[derive(Debug, Clone)]
pub struct KushWordProvider {
    http: reqwest::Client,
    base_url: String,
}

impl KushWordProvider {
    pub const NAME: &'static str = "Kush Words API";
    const BASE_URL: &'static str = "https://random-words-api.kushcreates.com";
    const FALLBACK: &'static [&'static str] = &[
        "apple", "banana", "orange", "grape", "mountain", "river", "ocean", "forest", "walk",
        "talk", "think", "laugh", "cry", "smile", "sleep", "eat",
    ];

    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: Self::BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl WordProvider for KushWordProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_words(&self, count: usize) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/word/{}?count={count}", self.base_url, noun_or_verb());
        let result = get_json::<Vec<WordItem>>(&self.http, &url).await.map(collect_words);
        Ok(or_fallback(Self::NAME, result, Self::FALLBACK, count))
    }
}

/// Batched words from `random-word-api.herokuapp.com`.
#[derive(Debug, Clone)]
pub struct HerokuWordProvider {
    http: reqwest::Client,
    base_url: String,
}

impl HerokuWordProvider {
    pub const NAME: &'static str = "Heroku Words";
    const BASE_URL: &'static str = "https://random-word-api.herokuapp.com";
    const FALLBACK: &'static [&'static str] = &[
        "circle", "square", "triangle", "heart", "butterfly", "flower", "rainbow", "cloud",
        "bicycle", "guitar", "piano", "drum", "soccer", "basketball", "tennis", "volleyball",
    ];

    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: Self::BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl WordProvider for HerokuWordProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_words(&self, count: usize) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/word?number={count}", self.base_url);
        let result = get_json::<Vec<WordItem>>(&self.http, &url).await.map(collect_words);
        Ok(or_fallback(Self::NAME, result, Self::FALLBACK, count))
    }
}

// ---------------------------------------------------------------------------
// Picker
// ---------------------------------------------------------------------------

/// Chooses the word for a new round.
///
/// Never fails: every failure mode maps to a fixed fallback word so a
/// round can always start.
#[derive(Clone)]
pub struct WordPicker {
    providers: Vec<Arc<dyn WordProvider>>,
}

impl WordPicker {
    pub fn new(providers: Vec<Arc<dyn WordProvider>>) -> Self {
        Self { providers }
    }

    /// The four built-in providers sharing one HTTP client.
    pub fn with_defaults(http: reqwest::Client) -> Self {
        Self::new(vec![
            Arc::new(OfflineWordProvider),
            Arc::new(RandomWordsApiProvider::new(http.clone())),
            Arc::new(KushWordProvider::new(http.clone())),
            Arc::new(HerokuWordProvider::new(http)),
        ])
    }

    /// Names of every registered provider.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Picks one enabled provider uniformly at random and fetches one word.
    pub async fn pick(&self, enabled: &[String]) -> String {
        let Some(chosen) = enabled.choose(&mut rand::rng()).cloned() else {
            return NO_PROVIDER_WORD.to_string();
        };

        let Some(provider) = self.providers.iter().find(|p| p.name() == chosen) else {
            warn!(provider = %chosen, "word provider not registered");
            return UNKNOWN_PROVIDER_WORD.to_string();
        };

        match provider.fetch_words(1).await {
            Ok(words) => match words.into_iter().next() {
                Some(word) => {
                    debug!(provider = %chosen, "picked word");
                    word
                }
                None => EMPTY_RESULT_WORD.to_string(),
            },
            Err(e) => {
                warn!(provider = %chosen, error = %e, "word fetch failed");
                FAILED_FETCH_WORD.to_string()
            }
        }
    }
}

impl std::fmt::Debug for WordPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordPicker").field("providers", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_word_item_plain_and_entry_lowercased() {
        let items: Vec<WordItem> =
            serde_json::from_str(r#"["Apple", {"word": " Rocket "}, "", {"word": ""}]"#).unwrap();
        assert_eq!(collect_words(items), vec!["apple", "rocket"]);
    }

    #[test]
    fn test_sample_draws_from_list() {
        let mut rng = StdRng::seed_from_u64(3);
        let words = sample(&["a", "b"], 5, &mut rng);
        assert_eq!(words.len(), 5);
        assert!(words.iter().all(|w| w == "a" || w == "b"));
    }

    #[test]
    fn test_or_fallback_error_uses_list() {
        let err = ProviderError::Status { url: "x".into(), status: 500 };
        let words = or_fallback("test", Err(err), &["only"], 2);
        assert_eq!(words, vec!["only", "only"]);
    }

    #[test]
    fn test_or_fallback_empty_uses_list() {
        let words = or_fallback("test", Ok(vec![]), &["only"], 1);
        assert_eq!(words, vec!["only"]);
    }

    #[test]
    fn test_or_fallback_ok_passes_through() {
        let words = or_fallback("test", Ok(vec!["kite".into()]), &["only"], 1);
        assert_eq!(words, vec!["kite"]);
    }

    #[tokio::test]
    async fn test_offline_provider_returns_requested_count() {
        let words = OfflineWordProvider.fetch_words(4).await.unwrap();
        assert_eq!(words.len(), 4);
        assert!(words.iter().all(|w| w.chars().all(|c| c.is_ascii_lowercase())));
    }
}
