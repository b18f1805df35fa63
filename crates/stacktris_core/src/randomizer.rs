//! Seeded 7-bag piece randomizer.

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::TetrominoKind;

/// Xorshift generator; deterministic for a given seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        let state = if seed == 0 {
            0x9E37_79B9_7F4A_7C15
        } else {
            seed
        };
        Self { state }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 32) as u32
    }
}

/// Deals every tetromino kind exactly once per bag of seven.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SevenBag {
    rng: Rng,
    bag: Vec<TetrominoKind>,
}

impl SevenBag {
    /// Creates a randomizer from a seed.
    #[instrument]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::new(seed),
            bag: Vec::with_capacity(TetrominoKind::ALL.len()),
        }
    }

    /// Draws the next kind, refilling and shuffling the bag when empty.
    pub fn next_kind(&mut self) -> TetrominoKind {
        if self.bag.is_empty() {
            self.refill();
        }
        // refill always leaves seven entries
        self.bag.pop().unwrap_or(TetrominoKind::O)
    }

    fn refill(&mut self) {
        self.bag.extend_from_slice(&TetrominoKind::ALL);
        for i in (1..self.bag.len()).rev() {
            let j = (self.rng.next_u32() as usize) % (i + 1);
            self.bag.swap(i, j);
        }
        trace!(bag = ?self.bag, "Refilled piece bag");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn each_bag_is_a_permutation() {
        let mut bag = SevenBag::new(42);
        for _ in 0..10 {
            let drawn: HashSet<_> = (0..7).map(|_| bag.next_kind()).collect();
            assert_eq!(drawn.len(), 7);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SevenBag::new(7);
        let mut b = SevenBag::new(7);
        let seq_a: Vec<_> = (0..21).map(|_| a.next_kind()).collect();
        let seq_b: Vec<_> = (0..21).map(|_| b.next_kind()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn zero_seed_is_usable() {
        let mut bag = SevenBag::new(0);
        let drawn: HashSet<_> = (0..7).map(|_| bag.next_kind()).collect();
        assert_eq!(drawn.len(), 7);
    }
}
