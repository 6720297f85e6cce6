//! Opponent reply strategies.
//!
//! The engine never reaches for a global RNG: the opponent's choice comes
//! through this trait, so tests can script the reply sequence and servers
//! can seed a reproducible game.

use rand::prelude::*;

/// Chooses the scripted opponent's reply.
///
/// `open` is the non-empty list of currently empty cell indices, in board
/// order. Implementations must return one of them.
pub trait Opponent {
    fn choose(&mut self, open: &[usize]) -> usize;
}

/// Picks uniformly at random among the open cells
pub struct RandomOpponent {
    rng: StdRng,
}

impl RandomOpponent {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded variant for reproducible games
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomOpponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Opponent for RandomOpponent {
    fn choose(&mut self, open: &[usize]) -> usize {
        *open
            .choose(&mut self.rng)
            .expect("choose called with no open cells")
    }
}

/// Plays a fixed script of cell indices; the deterministic test double.
///
/// Once the script runs out it falls back to the first open cell.
pub struct ScriptedOpponent {
    moves: Vec<usize>,
    cursor: usize,
}

impl ScriptedOpponent {
    pub fn new(moves: impl IntoIterator<Item = usize>) -> Self {
        Self {
            moves: moves.into_iter().collect(),
            cursor: 0,
        }
    }
}

impl Opponent for ScriptedOpponent {
    fn choose(&mut self, open: &[usize]) -> usize {
        match self.moves.get(self.cursor) {
            Some(&index) => {
                self.cursor += 1;
                index
            }
            None => open[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_random_opponent_picks_an_open_cell() {
        let mut opponent = RandomOpponent::with_seed(7);
        let open = vec![1, 4, 8];
        for _ in 0..20 {
            assert!(open.contains(&opponent.choose(&open)));
        }
    }

    #[test]
    fn test_seeded_opponent_is_reproducible() {
        let open = vec![0, 2, 3, 5, 7];
        let picks = |seed| {
            let mut opponent = RandomOpponent::with_seed(seed);
            (0..10).map(|_| opponent.choose(&open)).collect::<Vec<_>>()
        };
        assert_eq!(picks(42), picks(42));
    }

    #[test]
    fn test_scripted_opponent_follows_script() {
        let mut opponent = ScriptedOpponent::new([4, 8]);
        assert_eq!(opponent.choose(&[0, 4, 8]), 4);
        assert_eq!(opponent.choose(&[0, 8]), 8);
        // Script exhausted: first open cell.
        assert_eq!(opponent.choose(&[3, 5]), 3);
    }
}
