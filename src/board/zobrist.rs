//! Zobrist keys for incremental position hashing.
//!
//! The keys are generated from a fixed seed so hashes are deterministic across
//! runs, which is useful for testing and debugging. The key set is owned by
//! the engine context and shared by reference, there are no globals.

use crate::board::types::{Color, PieceKind, Square};

#[derive(Debug)]
pub struct ZobristKeys {
    /// One key per square and piece kind.
    pub piece_square: [[u64; 12]; 64],
    /// One key per combined castling-rights value (white rights * 4 + black).
    pub castling: [u64; 16],
    /// One key per en-passant file, applied only when the capture is possible.
    pub en_passant_file: [u64; 8],
    /// Toggled in whenever Black is to move.
    pub side_to_move: u64,
}

impl ZobristKeys {
    pub fn new() -> ZobristKeys {
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;

        let mut piece_square = [[0u64; 12]; 64];
        for square in &mut piece_square {
            for key in square {
                *key = next_random_u64(&mut seed);
            }
        }

        let mut castling = [0u64; 16];
        for key in &mut castling {
            *key = next_random_u64(&mut seed);
        }

        let mut en_passant_file = [0u64; 8];
        for key in &mut en_passant_file {
            *key = next_random_u64(&mut seed);
        }

        let side_to_move = next_random_u64(&mut seed);

        ZobristKeys {
            piece_square,
            castling,
            en_passant_file,
            side_to_move,
        }
    }

    #[inline]
    pub fn piece_key(&self, kind: PieceKind, square: Square) -> u64 {
        self.piece_square[square as usize][kind.index()]
    }

    /// Key for the combined castling-rights value of both groups.
    #[inline]
    pub fn castling_key(&self, white_rights: u8, black_rights: u8) -> u64 {
        self.castling[((white_rights << 2) | black_rights) as usize & 0x0F]
    }

    #[inline]
    pub fn side_key(&self, color: Color) -> u64 {
        match color {
            Color::White => 0,
            Color::Black => self.side_to_move,
        }
    }
}

impl Default for ZobristKeys {
    fn default() -> ZobristKeys {
        ZobristKeys::new()
    }
}

#[inline]
fn next_random_u64(state: &mut u64) -> u64 {
    // splitmix64
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_sets_are_deterministic() {
        let a = ZobristKeys::new();
        let b = ZobristKeys::new();
        assert_eq!(a.piece_square, b.piece_square);
        assert_eq!(a.castling, b.castling);
        assert_eq!(a.en_passant_file, b.en_passant_file);
        assert_eq!(a.side_to_move, b.side_to_move);
    }

    #[test]
    fn all_keys_are_distinct() {
        let keys = ZobristKeys::new();
        let mut seen = HashSet::new();
        for square in keys.piece_square.iter() {
            for key in square {
                assert!(seen.insert(*key));
            }
        }
        for key in keys.castling.iter().chain(keys.en_passant_file.iter()) {
            assert!(seen.insert(*key));
        }
        assert!(seen.insert(keys.side_to_move));
    }

    #[test]
    fn side_key_is_zero_for_white() {
        let keys = ZobristKeys::new();
        assert_eq!(keys.side_key(Color::White), 0);
        assert_eq!(keys.side_key(Color::Black), keys.side_to_move);
    }
}
