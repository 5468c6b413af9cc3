//! Fixed-depth alpha-beta search.
//!
//! The tree is searched to a fixed ply count, extended in simplified
//! endgames. Leaves are evaluated statically and cached in the
//! transposition table; interior scores depend on the search window and
//! are never cached, apart from mates and stalemates.

use std::sync::Arc;

use crate::board::attack_tables::AttackTables;
use crate::board::position::Position;
use crate::board::types::Color;
use crate::board::zobrist::ZobristKeys;
use crate::movegen::generator::MoveGenerator;
use crate::movegen::move_queue::Move;
use crate::search::control::SearchControl;
use crate::search::evaluate::{EvalContext, SIMPLE_ENDGAME_LIMIT};
use crate::search::transposition::TranspositionTable;

pub const MATE_SCORE: f32 = 10_000.0;

#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    /// Wall-clock limit enforced by the session, not the search itself.
    pub max_search_time_ms: u64,
    pub base_depth: u8,
    /// Depth used instead of `base_depth` in simplified endgames.
    pub extended_depth: u8,
    pub table_capacity: usize,
    /// Let interior nodes probe the table. Cached mate scores carry their
    /// original distance, so this trades accuracy for speed.
    pub read_below_max_depth: bool,
}

impl Default for SearchSettings {
    fn default() -> SearchSettings {
        SearchSettings {
            max_search_time_ms: 30_000,
            base_depth: 6,
            extended_depth: 8,
            table_capacity: 5_000_000,
            read_below_max_depth: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOutcome {
    pub best: Option<Move>,
    /// Score of `best` from White's point of view.
    pub score: f32,
    pub depth: u8,
    pub nodes: u64,
    pub leaf_positions: u64,
    pub checkmates: u64,
    pub table_entries: usize,
    /// The root loop ended before exhausting its moves, either on a found
    /// mate in one or on an abort request.
    pub early_stop: bool,
}

/// Legal moves plus the position status the session reports on `get`.
#[derive(Debug, Clone)]
pub struct MoveReport {
    pub moves: Vec<Move>,
    pub in_check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub insufficient_material: bool,
}

pub struct SearchEngine {
    tables: Arc<AttackTables>,
    keys: Arc<ZobristKeys>,
    pub position: Position,
    pub settings: SearchSettings,
    generator: MoveGenerator,
    table: TranspositionTable,
    context: EvalContext,
    max_depth: u8,
    nodes: u64,
    leaf_positions: u64,
    checkmates: u64,
}

impl SearchEngine {
    pub fn new(
        tables: Arc<AttackTables>,
        keys: Arc<ZobristKeys>,
        position: Position,
        settings: SearchSettings,
    ) -> SearchEngine {
        let context = EvalContext::new(&position);
        SearchEngine {
            tables,
            keys,
            position,
            settings,
            generator: MoveGenerator::new(),
            table: TranspositionTable::new(),
            context,
            max_depth: settings.base_depth,
            nodes: 0,
            leaf_positions: 0,
            checkmates: 0,
        }
    }

    /// Searches the current position to the configured depth. Honors abort
    /// requests between root moves and between interior children, returning
    /// the best move found so far.
    pub fn find_best_move(&mut self, control: &SearchControl) -> SearchOutcome {
        self.context = EvalContext::new(&self.position);
        self.max_depth = self.search_depth();
        self.nodes = 0;
        self.leaf_positions = 0;
        self.checkmates = 0;
        self.table.begin_search(self.settings.table_capacity);

        let phase = self.context.game_phase(&self.position);
        let mut queue = self.generator.generate(&self.tables, &self.position, phase);

        let mut outcome = SearchOutcome {
            depth: self.max_depth,
            ..SearchOutcome::default()
        };

        if queue.is_empty() {
            outcome.score = if self.generator.checkmate {
                mate_score(self.position.turn, 0)
            } else {
                0.0
            };
            outcome.table_entries = self.table.end_search();
            return outcome;
        }
        if queue.len() == 1 {
            // Forced reply, nothing to choose.
            outcome.best = queue.dequeue();
            outcome.table_entries = self.table.end_search();
            return outcome;
        }

        let maximizing = self.position.turn == Color::White;
        let mut alpha = f32::NEG_INFINITY;
        let mut beta = f32::INFINITY;
        let mut best_score = if maximizing {
            f32::NEG_INFINITY
        } else {
            f32::INFINITY
        };
        let mate_in_one = MATE_SCORE - 1.0;

        while let Some(mv) = queue.dequeue() {
            let score = self.calculate(1, &mv, alpha, beta, control);
            if maximizing {
                if score > best_score {
                    best_score = score;
                    outcome.best = Some(mv);
                }
                alpha = alpha.max(score);
                if score >= mate_in_one {
                    outcome.early_stop = true;
                    break;
                }
            } else {
                if score < best_score {
                    best_score = score;
                    outcome.best = Some(mv);
                }
                beta = beta.min(score);
                if score <= -mate_in_one {
                    outcome.early_stop = true;
                    break;
                }
            }
            if control.abort_requested() {
                outcome.early_stop = true;
                break;
            }
        }

        outcome.score = best_score;
        outcome.nodes = self.nodes;
        outcome.leaf_positions = self.leaf_positions;
        outcome.checkmates = self.checkmates;
        outcome.table_entries = self.table.end_search();
        outcome
    }

    /// Base depth, extended when the material is thin enough that mates need
    /// the extra plies more than the middlegame needs the speed.
    fn search_depth(&self) -> u8 {
        let total = self.position.white.material + self.position.black.material;
        if total <= SIMPLE_ENDGAME_LIMIT
            || self.position.white.material == 0
            || self.position.black.material == 0
        {
            self.settings.extended_depth
        } else {
            self.settings.base_depth
        }
    }

    /// Scores `mv` from the current position: make, descend, unmake.
    fn calculate(
        &mut self,
        depth: u8,
        mv: &Move,
        alpha: f32,
        beta: f32,
        control: &SearchControl,
    ) -> f32 {
        self.nodes += 1;
        self.position.make(mv, &self.tables, &self.keys);
        let score = if depth >= self.max_depth {
            self.leaf(depth)
        } else {
            self.interior(depth, alpha, beta, control)
        };
        self.position.unmake(mv);
        score
    }

    fn leaf(&mut self, depth: u8) -> f32 {
        if let Some(score) = self.table.probe(self.position.hash) {
            return score;
        }
        let phase = self.context.game_phase(&self.position);
        self.generator.survey_waiting_side(
            &self.tables,
            &self.position,
            phase,
            Some(&mut self.context),
        );
        if !self.generator.moving_side_has_move(&self.tables, &self.position) {
            if self.generator.checkmate {
                self.checkmates += 1;
                let score = mate_score(self.position.turn, depth);
                self.table.store(self.position.hash, score);
                return score;
            }
            self.table.store(self.position.hash, 0.0);
            return 0.0;
        }
        self.context.evaluate_moving_side(&self.position, phase);
        let score = self.context.evaluate(&self.position, phase);
        self.leaf_positions += 1;
        self.table.store(self.position.hash, score);
        score
    }

    fn interior(
        &mut self,
        depth: u8,
        mut alpha: f32,
        mut beta: f32,
        control: &SearchControl,
    ) -> f32 {
        if self.settings.read_below_max_depth {
            if let Some(score) = self.table.probe(self.position.hash) {
                return score;
            }
        }
        let phase = self.context.game_phase(&self.position);
        let mut queue = self.generator.generate(&self.tables, &self.position, phase);
        if queue.is_empty() {
            let score = if self.generator.checkmate {
                self.checkmates += 1;
                mate_score(self.position.turn, depth)
            } else {
                0.0
            };
            self.table.store(self.position.hash, score);
            return score;
        }

        if self.position.turn == Color::White {
            let mut best = f32::NEG_INFINITY;
            while let Some(mv) = queue.dequeue() {
                let score = self.calculate(depth + 1, &mv, alpha, beta, control);
                best = best.max(score);
                alpha = alpha.max(score);
                if beta <= alpha || control.abort_requested() {
                    break;
                }
            }
            best
        } else {
            let mut best = f32::INFINITY;
            while let Some(mv) = queue.dequeue() {
                let score = self.calculate(depth + 1, &mv, alpha, beta, control);
                best = best.min(score);
                beta = beta.min(score);
                if beta <= alpha || control.abort_requested() {
                    break;
                }
            }
            best
        }
    }

    /// Legal moves in search order plus the status flags the protocol
    /// reports.
    pub fn legal_move_report(&mut self) -> MoveReport {
        let phase = self.context.game_phase(&self.position);
        let mut queue = self.generator.generate(&self.tables, &self.position, phase);
        let mut moves = Vec::with_capacity(queue.len());
        while let Some(mv) = queue.dequeue() {
            moves.push(mv);
        }
        MoveReport {
            moves,
            in_check: self.generator.checks > 0,
            checkmate: self.generator.checkmate,
            stalemate: self.generator.stalemate,
            insufficient_material: insufficient_material(&self.position),
        }
    }
}

/// Score for the side to move being checkmated `depth` plies from the root.
/// Nearer mates score larger.
fn mate_score(loser: Color, depth: u8) -> f32 {
    match loser {
        Color::White => -(MATE_SCORE - depth as f32),
        Color::Black => MATE_SCORE - depth as f32,
    }
}

/// Neither side can force mate: two bare knights, or a lone minor piece at
/// most, on each side.
pub fn insufficient_material(position: &Position) -> bool {
    [&position.white, &position.black].iter().all(|group| {
        (group.piece_count == 3 && group.knight_count == 2)
            || (group.material < 50 && group.pawn_count == 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode::layout_from_board;
    use crate::test_support;

    fn engine_for(
        board: &str,
        turn: Color,
        settings: SearchSettings,
    ) -> SearchEngine {
        let tables = test_support::shared_tables();
        let keys = test_support::shared_keys();
        let layout = layout_from_board(board).expect("board should parse");
        let position = Position::from_layout(&layout, turn, 0, 0, None, &tables, &keys);
        SearchEngine::new(tables, keys, position, settings)
    }

    fn shallow_settings(depth: u8) -> SearchSettings {
        SearchSettings {
            base_depth: depth,
            extended_depth: depth,
            table_capacity: 1 << 16,
            ..SearchSettings::default()
        }
    }

    #[test]
    fn finds_mate_in_one_and_stops_early() {
        // Black king cornered on a8, white king b6, white rook h7; Rh8 mates.
        let board = "k00000000000000R0K0000000000000000000000000000000000000000000000";
        let mut engine = engine_for(board, Color::White, shallow_settings(3));
        let control = SearchControl::new();
        let outcome = engine.find_best_move(&control);
        let best = outcome.best.expect("a best move");
        assert_eq!((best.origin, best.destination), (15, 7));
        assert!(outcome.score >= MATE_SCORE - 2.0);
        assert!(outcome.early_stop);
    }

    #[test]
    fn mated_leaf_stores_the_mate_score_and_nothing_else() {
        // Black king a8 mated by the rook on h8, white king b6 covering the
        // seventh-rank escapes.
        let board = "k000000R000000000K0000000000000000000000000000000000000000000000";
        let mut engine = engine_for(board, Color::Black, shallow_settings(2));
        engine.table.begin_search(1 << 10);

        let score = engine.leaf(1);
        assert_eq!(score, MATE_SCORE - 1.0);
        assert_eq!(engine.table.probe(engine.position.hash), Some(MATE_SCORE - 1.0));
        assert_eq!(engine.table.len(), 1);
        assert_eq!(engine.checkmates, 1);
    }

    #[test]
    fn mated_interior_node_stores_the_mate_score() {
        let board = "k000000R000000000K0000000000000000000000000000000000000000000000";
        let mut engine = engine_for(board, Color::Black, shallow_settings(4));
        engine.table.begin_search(1 << 10);
        let control = SearchControl::new();

        let score = engine.interior(1, f32::NEG_INFINITY, f32::INFINITY, &control);
        assert_eq!(score, MATE_SCORE - 1.0);
        assert_eq!(engine.table.probe(engine.position.hash), Some(MATE_SCORE - 1.0));
        assert_eq!(engine.table.len(), 1);
    }

    #[test]
    fn captures_a_hanging_queen() {
        // Black queen on d5 defended by nothing, white rook on d1.
        let board = "k00000000000000000000000000q00000000000000000000000000000K0R0000";
        let mut engine = engine_for(board, Color::White, shallow_settings(2));
        let control = SearchControl::new();
        let outcome = engine.find_best_move(&control);
        let best = outcome.best.expect("a best move");
        assert_eq!(best.destination, 27);
        assert!(outcome.score > 50.0);
    }

    #[test]
    fn forced_reply_skips_the_search() {
        // White rook a1 checks the black king on a8; the queen on d7 covers
        // a7 and b7, leaving Kb8 as the only reply.
        let board = "k0000000000Q00000000000000000000000000000000000000000000R000K000";
        let mut engine = engine_for(board, Color::Black, shallow_settings(4));
        let control = SearchControl::new();
        let outcome = engine.find_best_move(&control);
        let best = outcome.best.expect("the forced reply");
        assert_eq!((best.origin, best.destination), (0, 1));
        assert_eq!(outcome.nodes, 0);
    }

    #[test]
    fn abort_request_returns_the_best_so_far() {
        let board = "rnbqkbnrpppppppp00000000000000000000000000000000PPPPPPPPRNBQKBNR";
        let mut engine = engine_for(board, Color::White, shallow_settings(4));
        let control = SearchControl::new();
        control.request_stop();
        let outcome = engine.find_best_move(&control);
        // The first root move completes before the abort is honored.
        assert!(outcome.best.is_some());
        assert!(outcome.early_stop);
    }

    #[test]
    fn thin_material_extends_the_depth() {
        let board = "0000k00000000000000000000000000000000000000000000000000R0000K000";
        let settings = SearchSettings {
            base_depth: 2,
            extended_depth: 4,
            table_capacity: 1 << 16,
            ..SearchSettings::default()
        };
        let mut engine = engine_for(board, Color::White, settings);
        let control = SearchControl::new();
        let outcome = engine.find_best_move(&control);
        assert_eq!(outcome.depth, 4);
    }

    #[test]
    fn two_knights_each_is_insufficient_material() {
        let board = "knn00000000000000000000000000000000000000000000000000000000NN0K0";
        let engine = engine_for(board, Color::White, shallow_settings(2));
        assert!(insufficient_material(&engine.position));
    }

    #[test]
    fn lone_minor_pieces_are_insufficient_but_a_rook_is_not() {
        let minor = "kb00000000000000000000000000000000000000000000000000000000B000K0";
        let engine = engine_for(minor, Color::White, shallow_settings(2));
        assert!(insufficient_material(&engine.position));

        let rook = "kr00000000000000000000000000000000000000000000000000000000R000K0";
        let engine = engine_for(rook, Color::White, shallow_settings(2));
        assert!(!insufficient_material(&engine.position));
    }

    #[test]
    fn alpha_beta_matches_a_full_width_minimax() {
        // A small middlegame-ish position with captures available both ways.
        let board = "0k0r00000pp000000000n00000000000000000B000000000PP0000000K0R0000";
        let mut engine = engine_for(board, Color::White, shallow_settings(2));
        let control = SearchControl::new();
        let outcome = engine.find_best_move(&control);

        let tables = test_support::shared_tables();
        let keys = test_support::shared_keys();
        let layout = layout_from_board(board).expect("board should parse");
        let mut position =
            Position::from_layout(&layout, Color::White, 0, 0, None, &tables, &keys);
        let mut context = EvalContext::new(&position);

        let phase = context.game_phase(&position);
        let mut generator = MoveGenerator::new();
        let mut queue = generator.generate(&tables, &position, phase);
        let mut best: Option<Move> = None;
        let mut best_score = f32::NEG_INFINITY;
        while let Some(mv) = queue.dequeue() {
            position.make(&mv, &tables, &keys);
            let score = minimax(&tables, &keys, &mut position, &mut context, 1, 2);
            position.unmake(&mv);
            if score > best_score {
                best_score = score;
                best = Some(mv);
            }
        }

        assert_eq!(outcome.score, best_score);
        let expected = best.expect("reference best move");
        let actual = outcome.best.expect("engine best move");
        assert_eq!((actual.origin, actual.destination), (expected.origin, expected.destination));
    }

    fn minimax(
        tables: &AttackTables,
        keys: &ZobristKeys,
        position: &mut Position,
        context: &mut EvalContext,
        depth: u8,
        max_depth: u8,
    ) -> f32 {
        let phase = context.game_phase(position);
        let mut generator = MoveGenerator::new();
        if depth >= max_depth {
            generator.survey_waiting_side(tables, position, phase, Some(context));
            if !generator.moving_side_has_move(tables, position) {
                return if generator.checkmate {
                    mate_score(position.turn, depth)
                } else {
                    0.0
                };
            }
            context.evaluate_moving_side(position, phase);
            return context.evaluate(position, phase);
        }
        let mut queue = generator.generate(tables, position, phase);
        if queue.is_empty() {
            return if generator.checkmate {
                mate_score(position.turn, depth)
            } else {
                0.0
            };
        }
        let maximizing = position.turn == Color::White;
        let mut best = if maximizing {
            f32::NEG_INFINITY
        } else {
            f32::INFINITY
        };
        while let Some(mv) = queue.dequeue() {
            position.make(&mv, tables, keys);
            let score = minimax(tables, keys, position, context, depth + 1, max_depth);
            position.unmake(&mv);
            best = if maximizing { best.max(score) } else { best.min(score) };
        }
        best
    }
}
