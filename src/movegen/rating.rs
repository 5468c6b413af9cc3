//! Move ordering heuristics.
//!
//! Captures are rated by victim value scaled down for expensive attackers,
//! promotions and castles get fixed seeds, and quiet moves fall back to the
//! phase-selected piece-square table of their destination.

use crate::board::position::Position;
use crate::board::types::{PieceKind, Square};
use crate::movegen::move_queue::MoveType;
use crate::search::eval_tables;
use crate::search::evaluate::Phase;

/// Capture target values by class: pawn, knight, bishop, rook, queen, king.
pub const CAPTURE_VALUES: [i32; 6] = [100, 200, 250, 350, 500, 0];
/// Attacker multipliers by class; cheap attackers make the better captures.
pub const CAPTURE_MULTIPLIERS: [f32; 6] = [1.5, 0.9, 0.8, 0.7, 0.5, 1.0];

pub const CASTLE_SHORT_RATING: i32 = 100;
pub const CASTLE_LONG_RATING: i32 = 70;
pub const PROMOTION_BASE_RATING: i32 = 1000;
const KING_QUIET_PENALTY: i32 = -20;

/// Rating for a non-castle, non-promotion move by `attacker` to
/// `destination`.
pub fn rate_move(
    position: &Position,
    phase: Phase,
    attacker: PieceKind,
    destination: Square,
) -> i32 {
    let class = attacker.class_index();
    if let Some(victim) = position.waiting().piece_at(destination) {
        let value = CAPTURE_VALUES[victim.class_index()];
        return (value as f32 * CAPTURE_MULTIPLIERS[class]) as i32;
    }
    match class {
        // Quiet queen moves carry no signal this early.
        4 => 0,
        5 => {
            if phase == Phase::Endgame {
                eval_tables::piece_square(phase, attacker, destination)
            } else {
                KING_QUIET_PENALTY
            }
        }
        _ => eval_tables::piece_square(phase, attacker, destination),
    }
}

/// Promotions outrank everything else; stronger targets first.
#[inline]
pub fn rate_promotion(kind: MoveType) -> i32 {
    PROMOTION_BASE_RATING + kind.digit() as i32
}
