//! Static evaluation and game-phase detection.
//!
//! Scores are from White's point of view in the material scale (pawn = 10).
//! The piece-square totals for both sides are accumulated elsewhere (the
//! waiting side during the control survey, the moving side in
//! [`EvalContext::evaluate_moving_side`]) and combined here.

use crate::board::masks::king_distance;
use crate::board::position::Position;
use crate::board::types::Color;
use crate::search::eval_tables;

/// Combined non-pawn material below which the game is an endgame.
pub const ENDGAME_MATERIAL_LIMIT: i32 = 210;
/// Vacated home-rank squares from which the game is a middlegame.
pub const DEVELOPMENT_LIMIT: i32 = 12;
/// Total material at or below which the cornering term activates.
pub const SIMPLE_ENDGAME_LIMIT: i32 = 90;
/// Bonus for holding both bishops.
pub const BISHOP_PAIR_BONUS: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

/// Per-search evaluation state: the phase the search started in, the
/// piece-count normalizer, and the accumulators the leaf evaluation combines.
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub initial_phase: Phase,
    /// `1 / (larger piece count * 100)`, scales the piece-square differential.
    pub max_pieces_eval: f32,
    pub white_development: f32,
    pub black_development: f32,
    pub white_pieces_eval: f32,
    pub black_pieces_eval: f32,
}

impl EvalContext {
    pub fn new(position: &Position) -> EvalContext {
        let larger = position.white.piece_count.max(position.black.piece_count).max(1);
        let mut context = EvalContext {
            initial_phase: Phase::Opening,
            max_pieces_eval: 1.0 / (larger as f32 * 100.0),
            white_development: 0.0,
            black_development: 0.0,
            white_pieces_eval: 0.0,
            black_pieces_eval: 0.0,
        };
        context.initial_phase = context.game_phase(position);
        context
    }

    /// Current phase. Once past the opening or into the endgame at search
    /// start, a position never reports an earlier phase.
    pub fn game_phase(&mut self, position: &Position) -> Phase {
        let piece_material = position.white.piece_material + position.black.piece_material;
        if piece_material < ENDGAME_MATERIAL_LIMIT || self.initial_phase == Phase::Endgame {
            return Phase::Endgame;
        }
        if self.development(position) >= DEVELOPMENT_LIMIT || self.initial_phase > Phase::Opening {
            return Phase::Middlegame;
        }
        Phase::Opening
    }

    /// Counts home-rank squares each side has vacated, caching the per-side
    /// eighths the opening term reads.
    pub fn development(&mut self, position: &Position) -> i32 {
        let white = home_rank_vacancies(position, Color::White);
        let black = home_rank_vacancies(position, Color::Black);
        self.white_development = white as f32 / 8.0;
        self.black_development = black as f32 / 8.0;
        white + black
    }

    /// Accumulates the moving side's piece-square total and bishop pair into
    /// the matching accumulator.
    pub fn evaluate_moving_side(&mut self, position: &Position, phase: Phase) {
        let group = position.mover();
        let mut total = 0i32;
        let mut bishops = 0u32;
        for (square, kind) in group.pieces() {
            total += eval_tables::piece_square(phase, kind, square);
            if kind.is_bishop() {
                bishops += 1;
            }
        }
        let mut total = total as f32;
        if bishops > 1 {
            total += BISHOP_PAIR_BONUS;
        }
        match position.turn {
            Color::White => self.white_pieces_eval = total,
            Color::Black => self.black_pieces_eval = total,
        }
    }

    /// Static score from White's point of view. Both piece-square
    /// accumulators must be current.
    pub fn evaluate(&mut self, position: &Position, phase: Phase) -> f32 {
        let material = (position.white.material - position.black.material) as f32;
        let mut score =
            material + (self.white_pieces_eval - self.black_pieces_eval) * self.max_pieces_eval;

        match phase {
            Phase::Opening => {
                score += self.white_development - self.black_development;
            }
            Phase::Middlegame => {}
            Phase::Endgame => {
                let total = position.white.material + position.black.material;
                if total <= SIMPLE_ENDGAME_LIMIT
                    || position.white.material == 0
                    || position.black.material == 0
                {
                    // Drive the kings together and the weak king to the edge.
                    let distance =
                        king_distance(position.white.king_square, position.black.king_square)
                            as f32;
                    if position.white.material > position.black.material
                        || position.black.material == 0
                    {
                        score += -distance
                            + eval_tables::KING_PRESSURE[position.black.king_square as usize]
                                as f32;
                    } else if position.black.material > position.white.material
                        || position.white.material == 0
                    {
                        score -= -distance
                            + eval_tables::KING_PRESSURE[position.white.king_square as usize]
                                as f32;
                    }
                }
            }
        }
        score
    }
}

fn home_rank_vacancies(position: &Position, color: Color) -> i32 {
    // Back-rank piece classes from the a-file: R N B Q K B N R.
    const HOME_CLASSES: [usize; 8] = [3, 1, 2, 4, 5, 2, 1, 3];
    let (group, base) = match color {
        Color::White => (&position.white, 56u8),
        Color::Black => (&position.black, 0u8),
    };
    let mut count = 0;
    for (offset, class) in HOME_CLASSES.iter().enumerate() {
        match group.piece_at(base + offset as u8) {
            Some(kind) if kind.class_index() == *class => {}
            _ => count += 1,
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::position::Position;
    use crate::protocol::encode::layout_from_board;
    use crate::test_support;

    const START_BOARD: &str =
        "rnbqkbnrpppppppp00000000000000000000000000000000PPPPPPPPRNBQKBNR";

    fn position_from(board: &str, turn: Color) -> Position {
        let layout = layout_from_board(board).expect("board should parse");
        Position::from_layout(
            &layout,
            turn,
            3,
            3,
            None,
            test_support::tables(),
            test_support::keys(),
        )
    }

    #[test]
    fn start_position_is_an_opening_and_evaluates_level() {
        let position = position_from(START_BOARD, Color::White);
        let mut context = EvalContext::new(&position);
        assert_eq!(context.initial_phase, Phase::Opening);

        let phase = context.game_phase(&position);
        assert_eq!(phase, Phase::Opening);
        context.evaluate_moving_side(&position, phase);
        let mut waiting = position.clone();
        waiting.turn = Color::Black;
        context.evaluate_moving_side(&waiting, phase);
        assert_eq!(context.evaluate(&position, phase), 0.0);
    }

    #[test]
    fn development_counts_vacated_home_squares() {
        // Both knights developed on each side.
        let board = "r0bqkb0rpppppppp00n00n0000000000000000000N00N000PPPPPPPPR0BQKB0R";
        let position = position_from(board, Color::White);
        let mut context = EvalContext::new(&position);
        assert_eq!(context.development(&position), 4);
        assert_eq!(context.white_development, 0.25);
        assert_eq!(context.black_development, 0.25);
    }

    #[test]
    fn low_piece_material_means_endgame() {
        // King and rook each: 50 + 50 < 210.
        let board = "0000k00r0000000000000000000000000000000000000000000000000000K00R";
        let position = position_from(board, Color::White);
        let mut context = EvalContext::new(&position);
        assert_eq!(context.initial_phase, Phase::Endgame);
        assert_eq!(context.game_phase(&position), Phase::Endgame);
    }

    #[test]
    fn heavy_development_means_middlegame() {
        let position = position_from(START_BOARD, Color::White);
        let mut context = EvalContext::new(&position);
        // Force the cached phase forward and confirm it sticks.
        context.initial_phase = Phase::Middlegame;
        assert_eq!(context.game_phase(&position), Phase::Middlegame);
    }

    #[test]
    fn cornering_term_rewards_pushing_the_bare_king_to_the_edge() {
        let tables = test_support::tables();
        let keys = test_support::keys();
        // White K+R against a bare black king, black king in the corner vs
        // in the center.
        let corner =
            "k0000000000000000000000000000000000000000000000000000000K00000R0";
        let center =
            "000000000000000000000000000k0000000000000000000000000000K00000R0";
        let corner_layout = layout_from_board(corner).expect("board should parse");
        let center_layout = layout_from_board(center).expect("board should parse");
        let corner_position =
            Position::from_layout(&corner_layout, Color::White, 0, 0, None, tables, keys);
        let center_position =
            Position::from_layout(&center_layout, Color::White, 0, 0, None, tables, keys);

        let mut context = EvalContext::new(&corner_position);
        let phase = context.game_phase(&corner_position);
        assert_eq!(phase, Phase::Endgame);
        let corner_score = context.evaluate(&corner_position, phase);

        let mut context = EvalContext::new(&center_position);
        let center_score = context.evaluate(&center_position, Phase::Endgame);
        assert!(
            corner_score > center_score,
            "cornered king should score better for the attacker"
        );
    }
}
