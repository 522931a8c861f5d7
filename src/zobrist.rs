use crate::game::{Game, MAX_PIECES};
use crate::moves::Position;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Zobrist hash for board states
pub struct Zobrist {
    cols: usize,
    // One key per (registry slot, cell), slot-major.
    piece_hashes: Vec<u64>,
}

impl Zobrist {
    /// Keys for boards with the dimensions of `game`.
    pub fn new(game: &Game) -> Self {
        // Use a seeded PRNG for reproducible Zobrist hashes
        let mut rng = ChaCha8Rng::seed_from_u64(0x123456789abcdef0);

        let cells = game.rows() * game.cols();
        let piece_hashes = (0..MAX_PIECES * cells).map(|_| rng.next_u64()).collect();

        Zobrist {
            cols: game.cols(),
            piece_hashes,
        }
    }

    /// Get hash value for the piece in registry slot `slot` standing at `pos`
    pub fn piece_hash(&self, slot: usize, pos: Position) -> u64 {
        let cells = self.piece_hashes.len() / MAX_PIECES;
        self.piece_hashes[slot * cells + pos.row as usize * self.cols + pos.col as usize]
    }

    /// Compute the hash for a game state.
    ///
    /// Only piece placement counts; the move count does not.
    pub fn compute_hash(&self, game: &Game) -> u64 {
        game.pieces()
            .iter()
            .enumerate()
            .fold(0u64, |hash, (slot, &(_, pos))| {
                hash ^ self.piece_hash(slot, pos)
            })
    }
}
