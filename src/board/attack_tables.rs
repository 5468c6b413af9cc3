//! Precomputed attack tables.
//!
//! Simple piece moves are tabulated straight from [`crate::board::masks`].
//! Sliding attacks use magic bitboards: each square gets a multiplier found by
//! seeded random search such that every blocker subset of its relevant mask
//! maps to a distinct table key. Lookup is then a mask, a multiply and a
//! shift.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::masks;
use crate::board::types::{Bitboard, Color, Square};

/// Seed for the magic search. Fixed so table construction is reproducible.
pub const MAGIC_SEED: u64 = 0x2C6E_9D8F_3A71_54B2;

/// Candidate attempts per square before construction gives up.
const MAX_MAGIC_ATTEMPTS: u32 = 1_000_000;

/// Magic key widths per square for rooks.
pub const ROOK_KEY_BITS: [u32; 64] = [
    12, 11, 11, 11, 11, 11, 11, 12, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    12, 11, 11, 11, 11, 11, 11, 12,
];

/// Magic key widths per square for bishops.
pub const BISHOP_KEY_BITS: [u32; 64] = [
    6, 5, 5, 5, 5, 5, 5, 6, //
    5, 5, 5, 5, 5, 5, 5, 5, //
    5, 5, 7, 7, 7, 7, 5, 5, //
    5, 5, 7, 9, 9, 7, 5, 5, //
    5, 5, 7, 9, 9, 7, 5, 5, //
    5, 5, 7, 7, 7, 7, 5, 5, //
    5, 5, 5, 5, 5, 5, 5, 5, //
    6, 5, 5, 5, 5, 5, 5, 6,
];

const ROOK_STRIDE: usize = 1 << 12;
const BISHOP_STRIDE: usize = 1 << 9;

pub struct AttackTables {
    pub white_pawn_control: [Bitboard; 64],
    pub black_pawn_control: [Bitboard; 64],
    pub white_pawn_push: [Bitboard; 64],
    pub black_pawn_push: [Bitboard; 64],
    pub knight_control: [Bitboard; 64],
    pub king_control: [Bitboard; 64],
    pub king_area: [Bitboard; 64],
    /// Rook control on an empty board, used for pin and x-ray checks.
    pub rook_free: [Bitboard; 64],
    /// Bishop control on an empty board.
    pub bishop_free: [Bitboard; 64],
    rook_masks: [Bitboard; 64],
    bishop_masks: [Bitboard; 64],
    rook_magics: [u64; 64],
    bishop_magics: [u64; 64],
    rook_table: Box<[Bitboard]>,
    bishop_table: Box<[Bitboard]>,
}

impl AttackTables {
    pub fn new() -> Result<AttackTables, String> {
        AttackTables::with_seed(MAGIC_SEED)
    }

    pub fn with_seed(seed: u64) -> Result<AttackTables, String> {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut tables = AttackTables {
            white_pawn_control: [0; 64],
            black_pawn_control: [0; 64],
            white_pawn_push: [0; 64],
            black_pawn_push: [0; 64],
            knight_control: [0; 64],
            king_control: [0; 64],
            king_area: [0; 64],
            rook_free: [0; 64],
            bishop_free: [0; 64],
            rook_masks: [0; 64],
            bishop_masks: [0; 64],
            rook_magics: [0; 64],
            bishop_magics: [0; 64],
            rook_table: vec![0; 64 * ROOK_STRIDE].into_boxed_slice(),
            bishop_table: vec![0; 64 * BISHOP_STRIDE].into_boxed_slice(),
        };

        for square in 0..64u8 {
            let at = square as usize;
            tables.white_pawn_control[at] = masks::white_pawn_control(square);
            tables.black_pawn_control[at] = masks::black_pawn_control(square);
            tables.white_pawn_push[at] = masks::white_pawn_push(square);
            tables.black_pawn_push[at] = masks::black_pawn_push(square);
            tables.knight_control[at] = masks::knight_control(square);
            tables.king_control[at] = masks::king_control(square);
            tables.king_area[at] = masks::king_area(square);
            tables.rook_free[at] = masks::rook_free_control(square);
            tables.bishop_free[at] = masks::bishop_free_control(square);
            tables.rook_masks[at] = masks::rook_blocker_mask(square);
            tables.bishop_masks[at] = masks::bishop_blocker_mask(square);
        }

        for square in 0..64u8 {
            let at = square as usize;

            let subsets = blocker_subsets(tables.rook_masks[at]);
            let magic = find_magic(&mut rng, &subsets, ROOK_KEY_BITS[at])
                .map_err(|e| format!("rook magic for square {square}: {e}"))?;
            tables.rook_magics[at] = magic;
            for &subset in &subsets {
                let key = magic_key(subset, magic, ROOK_KEY_BITS[at]);
                tables.rook_table[at * ROOK_STRIDE + key] = masks::rook_ray_attack(square, subset);
            }

            let subsets = blocker_subsets(tables.bishop_masks[at]);
            let magic = find_magic(&mut rng, &subsets, BISHOP_KEY_BITS[at])
                .map_err(|e| format!("bishop magic for square {square}: {e}"))?;
            tables.bishop_magics[at] = magic;
            for &subset in &subsets {
                let key = magic_key(subset, magic, BISHOP_KEY_BITS[at]);
                tables.bishop_table[at * BISHOP_STRIDE + key] =
                    masks::bishop_ray_attack(square, subset);
            }
        }

        Ok(tables)
    }

    /// Rook attack set for the given occupancy. Irrelevant occupancy bits are
    /// masked off internally, so callers may pass the full board.
    #[inline]
    pub fn rook_attacks(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        let at = square as usize;
        let blockers = occupancy & self.rook_masks[at];
        let key = magic_key(blockers, self.rook_magics[at], ROOK_KEY_BITS[at]);
        self.rook_table[at * ROOK_STRIDE + key]
    }

    /// Bishop attack set for the given occupancy.
    #[inline]
    pub fn bishop_attacks(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        let at = square as usize;
        let blockers = occupancy & self.bishop_masks[at];
        let key = magic_key(blockers, self.bishop_magics[at], BISHOP_KEY_BITS[at]);
        self.bishop_table[at * BISHOP_STRIDE + key]
    }

    #[inline]
    pub fn pawn_control(&self, color: Color, square: Square) -> Bitboard {
        match color {
            Color::White => self.white_pawn_control[square as usize],
            Color::Black => self.black_pawn_control[square as usize],
        }
    }

    #[inline]
    pub fn pawn_push(&self, color: Color, square: Square) -> Bitboard {
        match color {
            Color::White => self.white_pawn_push[square as usize],
            Color::Black => self.black_pawn_push[square as usize],
        }
    }
}

#[inline]
fn magic_key(blockers: Bitboard, magic: u64, bits: u32) -> usize {
    (blockers.wrapping_mul(magic) >> (64 - bits)) as usize
}

/// All subsets of `mask`, enumerated with the carry-rippler trick.
fn blocker_subsets(mask: Bitboard) -> Vec<Bitboard> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset: Bitboard = 0;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

/// Searches for a multiplier mapping every subset to a distinct key.
fn find_magic(rng: &mut StdRng, subsets: &[Bitboard], bits: u32) -> Result<u64, String> {
    let mut seen = vec![0u32; 1 << bits];
    for attempt in 1..=MAX_MAGIC_ATTEMPTS {
        // Sparse candidates collide far less often than uniform ones.
        let candidate = rng.random::<u64>() & rng.random::<u64>() & rng.random::<u64>();
        let mut collided = false;
        for &subset in subsets {
            let key = magic_key(subset, candidate, bits);
            if seen[key] == attempt {
                collided = true;
                break;
            }
            seen[key] = attempt;
        }
        if !collided {
            return Ok(candidate);
        }
    }
    Err(format!("no magic found in {MAX_MAGIC_ATTEMPTS} attempts"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::masks;
    use crate::test_support;

    #[test]
    fn key_bits_match_blocker_mask_sizes() {
        for square in 0..64u8 {
            let at = square as usize;
            assert_eq!(
                masks::rook_blocker_mask(square).count_ones(),
                ROOK_KEY_BITS[at],
                "rook key width on square {square}"
            );
            assert_eq!(
                masks::bishop_blocker_mask(square).count_ones(),
                BISHOP_KEY_BITS[at],
                "bishop key width on square {square}"
            );
        }
    }

    #[test]
    fn magic_lookups_match_ray_walks() {
        let tables = test_support::tables();
        let mut rng = StdRng::seed_from_u64(77);
        for square in 0..64u8 {
            for _ in 0..32 {
                let occupancy = rng.random::<u64>() & rng.random::<u64>();
                assert_eq!(
                    tables.rook_attacks(square, occupancy),
                    masks::rook_ray_attack(square, occupancy & masks::rook_blocker_mask(square)),
                    "rook attacks on square {square}"
                );
                assert_eq!(
                    tables.bishop_attacks(square, occupancy),
                    masks::bishop_ray_attack(
                        square,
                        occupancy & masks::bishop_blocker_mask(square)
                    ),
                    "bishop attacks on square {square}"
                );
            }
        }
    }

    #[test]
    fn empty_board_lookups_match_free_masks() {
        let tables = test_support::tables();
        for square in 0..64u8 {
            let at = square as usize;
            assert_eq!(tables.rook_attacks(square, 0), tables.rook_free[at]);
            assert_eq!(tables.bishop_attacks(square, 0), tables.bishop_free[at]);
        }
    }

    #[test]
    fn simple_piece_tables_match_mask_constructors() {
        let tables = test_support::tables();
        for square in 0..64u8 {
            let at = square as usize;
            assert_eq!(tables.knight_control[at], masks::knight_control(square));
            assert_eq!(tables.king_control[at], masks::king_control(square));
            assert_eq!(tables.king_area[at], masks::king_area(square));
            assert_eq!(
                tables.pawn_control(Color::White, square),
                masks::white_pawn_control(square)
            );
            assert_eq!(
                tables.pawn_push(Color::Black, square),
                masks::black_pawn_push(square)
            );
        }
    }
}
