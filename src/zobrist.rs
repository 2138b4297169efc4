use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::tessellation::Position;

/// Random keys for every (position, piece kind, plus id slot) triple.
///
/// Slots index the distinct plus ids in use; with Sokoban+ disabled there is
/// exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zobrist {
    initial: u64,
    size: usize,
    slots: usize,
    box_hashes: Vec<u64>,
    goal_hashes: Vec<u64>,
    pusher_hashes: Vec<u64>,
}

impl Zobrist {
    pub fn new(size: usize, slots: usize) -> Self {
        // Use a seeded PRNG for reproducible Zobrist hashes
        let mut rng = ChaCha8Rng::seed_from_u64(0x123456789abcdef0);

        let initial = rng.next_u64();
        let mut table = |len: usize| (0..len).map(|_| rng.next_u64()).collect::<Vec<_>>();
        let pusher_hashes = table(size);
        let box_hashes = table(size * slots);
        let goal_hashes = table(size * slots);

        Zobrist {
            initial,
            size,
            slots,
            box_hashes,
            goal_hashes,
            pusher_hashes,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Seed every state hash starts from.
    pub fn initial_hash(&self) -> u64 {
        self.initial
    }

    /// Get hash value for a box at a specific position
    pub fn box_hash(&self, position: Position, slot: usize) -> u64 {
        self.box_hashes[slot * self.size + position]
    }

    pub fn goal_hash(&self, position: Position, slot: usize) -> u64 {
        self.goal_hashes[slot * self.size + position]
    }

    /// Get hash value for pusher position
    pub fn pusher_hash(&self, position: Position) -> u64 {
        self.pusher_hashes[position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_reproducible() {
        let a = Zobrist::new(16, 2);
        let b = Zobrist::new(16, 2);
        assert_eq!(a, b);
        assert_eq!(a.box_hash(5, 1), b.box_hash(5, 1));
    }

    #[test]
    fn test_keys_are_distinct() {
        let z = Zobrist::new(8, 2);
        let mut keys = vec![z.initial_hash()];
        for position in 0..8 {
            keys.push(z.pusher_hash(position));
            for slot in 0..2 {
                keys.push(z.box_hash(position, slot));
                keys.push(z.goal_hash(position, slot));
            }
        }
        let count = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), count);
    }
}
