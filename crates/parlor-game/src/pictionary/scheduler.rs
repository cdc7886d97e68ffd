//! Drawer selection, guess matching and scoring.

use std::collections::BTreeMap;

use parlor_protocol::PeerId;
use rand::Rng;

use super::Player;
use crate::PictionaryConfig;

/// Picks the next drawer by weighted random choice.
///
/// Each player's weight is `max_draw_count - draw_count + 1`, so players
/// who have drawn less are proportionally more likely to be picked, but
/// nobody is ever excluded. Returns `None` for an empty roster.
pub fn select_next_drawer(
    players: &BTreeMap<PeerId, Player>,
    rng: &mut impl Rng,
) -> Option<PeerId> {
    let max = players.values().map(|p| p.draw_count).max()?;
    let weight = |p: &Player| u64::from(max - p.draw_count) + 1;
    let total: u64 = players.values().map(&weight).sum();

    let mut roll = rng.random_range(0..total);
    for player in players.values() {
        let w = weight(player);
        if roll < w {
            return Some(player.id.clone());
        }
        roll -= w;
    }
    None
}

/// Lower-cases and trims a guess or word for comparison.
pub fn normalize_guess(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Exact match after normalisation. No fuzzy matching.
pub fn is_correct_guess(guess: &str, word: &str) -> bool {
    let guess = normalize_guess(guess);
    !guess.is_empty() && guess == normalize_guess(word)
}

/// New absolute scores for every player after `guesser` found the word
/// drawn by `drawer`.
pub fn score_correct_guess(
    players: &BTreeMap<PeerId, Player>,
    guesser: &PeerId,
    drawer: &PeerId,
    config: &PictionaryConfig,
) -> BTreeMap<PeerId, u32> {
    players
        .values()
        .map(|p| {
            let mut score = p.score;
            if &p.id == guesser {
                score += config.guesser_points;
            }
            if &p.id == drawer {
                score += config.drawer_points;
            }
            (p.id.clone(), score)
        })
        .collect()
}
