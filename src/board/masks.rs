//! Per-square mask constructors.
//!
//! These build the raw attack and blocker masks that `AttackTables` tabulates
//! at startup. All of them work on the row-major top-down square layout from
//! [`crate::board::types`].

use crate::board::types::{bit, Bitboard, Square};

#[inline]
const fn row_of(square: Square) -> i32 {
    (square / 8) as i32
}

#[inline]
const fn col_of(square: Square) -> i32 {
    (square % 8) as i32
}

#[inline]
fn on_board(row: i32, col: i32) -> bool {
    (0..8).contains(&row) && (0..8).contains(&col)
}

#[inline]
fn square_at(row: i32, col: i32) -> Square {
    (row * 8 + col) as Square
}

/// Squares a white pawn on `square` attacks. Zero on the back ranks.
pub fn white_pawn_control(square: Square) -> Bitboard {
    let (row, col) = (row_of(square), col_of(square));
    if !(1..=6).contains(&row) {
        return 0;
    }
    let mut mask = 0;
    if col > 0 {
        mask |= bit(square_at(row - 1, col - 1));
    }
    if col < 7 {
        mask |= bit(square_at(row - 1, col + 1));
    }
    mask
}

/// Squares a black pawn on `square` attacks. Zero on the back ranks.
pub fn black_pawn_control(square: Square) -> Bitboard {
    let (row, col) = (row_of(square), col_of(square));
    if !(1..=6).contains(&row) {
        return 0;
    }
    let mut mask = 0;
    if col > 0 {
        mask |= bit(square_at(row + 1, col - 1));
    }
    if col < 7 {
        mask |= bit(square_at(row + 1, col + 1));
    }
    mask
}

/// Push targets for a white pawn, including the double push from its
/// starting rank.
pub fn white_pawn_push(square: Square) -> Bitboard {
    let row = row_of(square);
    if !(1..=6).contains(&row) {
        return 0;
    }
    let mut mask = bit(square - 8);
    if row == 6 {
        mask |= bit(square - 16);
    }
    mask
}

/// Push targets for a black pawn, including the double push.
pub fn black_pawn_push(square: Square) -> Bitboard {
    let row = row_of(square);
    if !(1..=6).contains(&row) {
        return 0;
    }
    let mut mask = bit(square + 8);
    if row == 1 {
        mask |= bit(square + 16);
    }
    mask
}

pub fn knight_control(square: Square) -> Bitboard {
    const JUMPS: [(i32, i32); 8] = [
        (-2, -1),
        (-2, 1),
        (-1, -2),
        (-1, 2),
        (1, -2),
        (1, 2),
        (2, -1),
        (2, 1),
    ];
    let (row, col) = (row_of(square), col_of(square));
    let mut mask = 0;
    for (dr, dc) in JUMPS {
        if on_board(row + dr, col + dc) {
            mask |= bit(square_at(row + dr, col + dc));
        }
    }
    mask
}

pub fn king_control(square: Square) -> Bitboard {
    let (row, col) = (row_of(square), col_of(square));
    let mut mask = 0;
    for dr in -1..=1 {
        for dc in -1..=1 {
            if (dr, dc) != (0, 0) && on_board(row + dr, col + dc) {
                mask |= bit(square_at(row + dr, col + dc));
            }
        }
    }
    mask
}

/// Two-square neighborhood around the king, knight jumps included.
pub fn king_area(square: Square) -> Bitboard {
    let (row, col) = (row_of(square), col_of(square));
    let mut mask = 0;
    for dr in -2..=2 {
        for dc in -2..=2 {
            if (dr, dc) != (0, 0) && on_board(row + dr, col + dc) {
                mask |= bit(square_at(row + dr, col + dc));
            }
        }
    }
    mask | knight_control(square)
}

const ROOK_DIRECTIONS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

fn ray_control(square: Square, directions: &[(i32, i32); 4]) -> Bitboard {
    let (row, col) = (row_of(square), col_of(square));
    let mut mask = 0;
    for &(dr, dc) in directions {
        let (mut r, mut c) = (row + dr, col + dc);
        while on_board(r, c) {
            mask |= bit(square_at(r, c));
            r += dr;
            c += dc;
        }
    }
    mask
}

/// Full rank and file control with no blockers.
pub fn rook_free_control(square: Square) -> Bitboard {
    ray_control(square, &ROOK_DIRECTIONS)
}

/// Full diagonal control with no blockers.
pub fn bishop_free_control(square: Square) -> Bitboard {
    ray_control(square, &BISHOP_DIRECTIONS)
}

fn blocker_mask(square: Square, directions: &[(i32, i32); 4]) -> Bitboard {
    let (row, col) = (row_of(square), col_of(square));
    let mut mask = 0;
    for &(dr, dc) in directions {
        let (mut r, mut c) = (row + dr, col + dc);
        // Stop one short of the edge: an edge blocker never changes the attack.
        while on_board(r + dr, c + dc) {
            mask |= bit(square_at(r, c));
            r += dr;
            c += dc;
        }
    }
    mask
}

/// Relevant-blocker mask for a rook: rank and file, edges trimmed.
pub fn rook_blocker_mask(square: Square) -> Bitboard {
    blocker_mask(square, &ROOK_DIRECTIONS)
}

/// Relevant-blocker mask for a bishop: diagonals, edges trimmed.
pub fn bishop_blocker_mask(square: Square) -> Bitboard {
    blocker_mask(square, &BISHOP_DIRECTIONS)
}

fn ray_attack(square: Square, blockers: Bitboard, directions: &[(i32, i32); 4]) -> Bitboard {
    let (row, col) = (row_of(square), col_of(square));
    let mut mask = 0;
    for &(dr, dc) in directions {
        let (mut r, mut c) = (row + dr, col + dc);
        while on_board(r, c) {
            let square_bit = bit(square_at(r, c));
            mask |= square_bit;
            if blockers & square_bit != 0 {
                break;
            }
            r += dr;
            c += dc;
        }
    }
    mask
}

/// Rook attack set by ray walk, stopping at and including the first blocker.
pub fn rook_ray_attack(square: Square, blockers: Bitboard) -> Bitboard {
    ray_attack(square, blockers, &ROOK_DIRECTIONS)
}

/// Bishop attack set by ray walk, stopping at and including the first blocker.
pub fn bishop_ray_attack(square: Square, blockers: Bitboard) -> Bitboard {
    ray_attack(square, blockers, &BISHOP_DIRECTIONS)
}

/// Manhattan distance between two squares.
#[inline]
pub fn king_distance(a: Square, b: Square) -> i32 {
    (row_of(a) - row_of(b)).abs() + (col_of(a) - col_of(b)).abs()
}

/// Renders a bitboard as an 8x8 grid, top rank first. Debug and log output.
pub fn render_bitboard(mask: Bitboard) -> String {
    let mut out = String::with_capacity(72);
    for square in 0..64u8 {
        out.push(if mask & bit(square) != 0 { '1' } else { '.' });
        if square % 8 == 7 {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pawn_control_handles_files_and_colors() {
        // White pawn on e2 (square 52) attacks d3 and f3.
        assert_eq!(white_pawn_control(52), bit(43) | bit(45));
        // A-file pawn has one target.
        assert_eq!(white_pawn_control(48), bit(41));
        // Black pawn on e7 (square 12) attacks d6 and f6.
        assert_eq!(black_pawn_control(12), bit(19) | bit(21));
        // Back ranks carry no pawn masks.
        assert_eq!(white_pawn_control(4), 0);
        assert_eq!(black_pawn_control(60), 0);
    }

    #[test]
    fn pawn_pushes_include_double_from_start_rank() {
        assert_eq!(white_pawn_push(52), bit(44) | bit(36));
        assert_eq!(white_pawn_push(44), bit(36));
        assert_eq!(black_pawn_push(12), bit(20) | bit(28));
        assert_eq!(black_pawn_push(20), bit(28));
    }

    #[test]
    fn knight_and_king_counts_by_placement() {
        assert_eq!(knight_control(0).count_ones(), 2);
        assert_eq!(knight_control(27).count_ones(), 8);
        assert_eq!(king_control(0).count_ones(), 3);
        assert_eq!(king_control(27).count_ones(), 8);
        assert_eq!(king_area(27).count_ones(), 24);
    }

    #[test]
    fn blocker_masks_trim_edges() {
        // Rook on a1: 6 inner file squares + 6 inner rank squares.
        assert_eq!(rook_blocker_mask(56).count_ones(), 12);
        // Rook on d4 keeps 10 relevant squares.
        assert_eq!(rook_blocker_mask(35).count_ones(), 10);
        // Bishop in a corner sees one long diagonal, trimmed to 6.
        assert_eq!(bishop_blocker_mask(0).count_ones(), 6);
    }

    #[test]
    fn ray_attacks_stop_at_and_include_blockers() {
        // Rook on a1 (56), blocker on a4 (32): up the file a2, a3, a4 plus the
        // full first rank.
        let attacks = rook_ray_attack(56, bit(32));
        assert_eq!(attacks & (bit(48) | bit(40) | bit(32)), bit(48) | bit(40) | bit(32));
        assert_eq!(attacks & bit(24), 0);
        assert_eq!(attacks.count_ones(), 10);

        // No blockers matches the free mask.
        assert_eq!(rook_ray_attack(35, 0), rook_free_control(35));
        assert_eq!(bishop_ray_attack(35, 0), bishop_free_control(35));
    }

    #[test]
    fn manhattan_distance() {
        assert_eq!(king_distance(0, 63), 14);
        assert_eq!(king_distance(27, 27), 0);
        assert_eq!(king_distance(27, 36), 2);
    }

    #[test]
    fn render_produces_eight_rows() {
        let grid = render_bitboard(bit(0) | bit(63));
        let rows: Vec<&str> = grid.lines().collect();
        assert_eq!(rows.len(), 8);
        assert!(rows[0].starts_with('1'));
        assert!(rows[7].ends_with('1'));
    }
}
