//! Client configuration.
//!
//! Every setting has a default. [`ClientConfig::from_env`] overrides
//! individual fields from `PARLOR_*` environment variables:
//!
//! | Variable                       | Field                               |
//! |--------------------------------|-------------------------------------|
//! | `PARLOR_BIND_ADDR`             | `session.bind_addr`                 |
//! | `PARLOR_ROUND_SECS`            | `pictionary.round_duration_secs`    |
//! | `PARLOR_SCOREBOARD_DELAY_MS`   | `pictionary.scoreboard_delay`       |
//! | `PARLOR_WORD_PROVIDERS`        | `word_providers` (comma separated)  |
//! | `PARLOR_CHARACTER_PROVIDERS`   | `character_providers`               |
//! | `PARLOR_RENDEZVOUS_FILE`       | `rendezvous_file`                   |
//! | `PARLOR_RENDEZVOUS_TIMEOUT_MS` | `rendezvous_timeout`                |

use std::path::PathBuf;
use std::time::Duration;

use parlor_game::{GuessWhoConfig, PictionaryConfig};
use parlor_providers::{
    HerokuWordProvider, KushWordProvider, OfflineWordProvider, RandomWordsApiProvider,
};
use parlor_session::{DirectoryRendezvous, SessionConfig, WithFallback};

/// A `PARLOR_*` variable held a value that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Everything a game client needs to know before opening a room.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub session: SessionConfig,
    pub pictionary: PictionaryConfig,
    pub guess_who: GuessWhoConfig,

    /// Word providers a Pictionary host picks from. Empty disables all of
    /// them, which makes every round's word `"cat"`.
    pub word_providers: Vec<String>,

    /// Character sources for a Guess-Who board. Empty means all.
    pub character_providers: Vec<String>,

    /// Shared room directory. `None` uses the per-machine default.
    pub rendezvous_file: Option<PathBuf>,

    /// How long the shared directory may take before the local default
    /// is tried instead.
    pub rendezvous_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            pictionary: PictionaryConfig::default(),
            guess_who: GuessWhoConfig::default(),
            word_providers: [
                OfflineWordProvider::NAME,
                RandomWordsApiProvider::NAME,
                KushWordProvider::NAME,
                HerokuWordProvider::NAME,
            ]
            .iter()
            .map(|name| (*name).to_string())
            .collect(),
            character_providers: Vec::new(),
            rendezvous_file: None,
            rendezvous_timeout: Duration::from_secs(3),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by whichever `PARLOR_*` variables are set.
    ///
    /// # Errors
    /// [`ConfigError`] naming the first variable that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("PARLOR_BIND_ADDR") {
            config.session.bind_addr = addr.trim().to_string();
        }
        if let Some(value) = lookup("PARLOR_ROUND_SECS") {
            let secs = parse_number("PARLOR_ROUND_SECS", &value)?;
            if secs == 0 {
                return Err(invalid("PARLOR_ROUND_SECS", &value, "must be at least 1"));
            }
            config.pictionary.round_duration_secs = u32::try_from(secs)
                .map_err(|_| invalid("PARLOR_ROUND_SECS", &value, "too large"))?;
        }
        if let Some(value) = lookup("PARLOR_SCOREBOARD_DELAY_MS") {
            let ms = parse_number("PARLOR_SCOREBOARD_DELAY_MS", &value)?;
            config.pictionary.scoreboard_delay = Duration::from_millis(ms);
        }
        if let Some(value) = lookup("PARLOR_WORD_PROVIDERS") {
            config.word_providers = split_list(&value);
        }
        if let Some(value) = lookup("PARLOR_CHARACTER_PROVIDERS") {
            config.character_providers = split_list(&value);
        }
        if let Some(path) = lookup("PARLOR_RENDEZVOUS_FILE") {
            config.rendezvous_file = Some(PathBuf::from(path.trim()));
        }
        if let Some(value) = lookup("PARLOR_RENDEZVOUS_TIMEOUT_MS") {
            let ms = parse_number("PARLOR_RENDEZVOUS_TIMEOUT_MS", &value)?;
            config.rendezvous_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// The room directory clients on this machine share: the configured
    /// file first, the default file if that one is slow or broken.
    pub fn rendezvous(&self) -> WithFallback<DirectoryRendezvous, DirectoryRendezvous> {
        let primary = match &self.rendezvous_file {
            Some(path) => DirectoryRendezvous::new(path.clone()),
            None => DirectoryRendezvous::default(),
        };
        WithFallback::new(primary, DirectoryRendezvous::default(), self.rendezvous_timeout)
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(var, value, &e.to_string()))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
