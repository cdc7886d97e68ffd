use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::Character;
use crate::GameError;

/// One dealt game: both boards and both secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    pub host_board: Vec<Character>,
    pub host_secret: Character,
    pub guest_board: Vec<Character>,
    pub guest_secret: Character,
}

/// Deals a game from `characters`.
///
/// Both boards hold every character, independently shuffled. The two
/// secrets are always different characters.
pub fn deal(characters: &[Character], rng: &mut impl Rng) -> Result<Deal, GameError> {
    if characters.len() < 2 {
        return Err(GameError::NotEnoughCharacters(characters.len()));
    }

    let host_secret = characters
        .choose(rng)
        .cloned()
        .ok_or(GameError::NotEnoughCharacters(0))?;
    let others: Vec<&Character> = characters.iter().filter(|c| c.id != host_secret.id).collect();
    let guest_secret = others
        .choose(rng)
        .map(|c| (*c).clone())
        .ok_or(GameError::NotEnoughCharacters(1))?;

    let mut host_board = characters.to_vec();
    host_board.shuffle(rng);
    let mut guest_board = characters.to_vec();
    guest_board.shuffle(rng);

    Ok(Deal {
        host_board,
        host_secret,
        guest_board,
        guest_secret,
    })
}
