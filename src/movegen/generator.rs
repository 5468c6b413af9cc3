//! Legal move generation.
//!
//! One survey pass over the waiting side accumulates its control map (sliders
//! x-rayed through the mover's king), counts checkers and records pin masks.
//! Generation then branches on the check count: the zero-check branch emits
//! everything within pin restrictions, the one-check branch restricts
//! non-king moves to blocking or capturing the checker, and the double-check
//! branch moves only the king.

use crate::board::attack_tables::AttackTables;
use crate::board::position::Position;
use crate::board::types::{bit, BitIter, Bitboard, Color, PieceKind, Square, LONG_CASTLE, SHORT_CASTLE};
use crate::movegen::move_queue::{Move, MoveQueue, MoveType};
use crate::movegen::rating;
use crate::search::eval_tables;
use crate::search::evaluate::{EvalContext, Phase};

pub struct MoveGenerator {
    /// Squares the waiting side controls, x-rayed through the mover's king.
    pub control: Bitboard,
    /// With exactly one checker: its square plus the squares between it and
    /// the king.
    pub check_map: Bitboard,
    pub checks: u8,
    pins: [Bitboard; 64],
    pub checkmate: bool,
    pub stalemate: bool,
}

impl MoveGenerator {
    pub fn new() -> MoveGenerator {
        MoveGenerator {
            control: 0,
            check_map: 0,
            checks: 0,
            pins: [0; 64],
            checkmate: false,
            stalemate: false,
        }
    }

    /// Full legal move generation for the side to move. Sets the checkmate or
    /// stalemate flag when the queue comes back empty.
    pub fn generate(
        &mut self,
        tables: &AttackTables,
        position: &Position,
        phase: Phase,
    ) -> MoveQueue {
        self.survey_waiting_side(tables, position, phase, None);
        let mut queue = MoveQueue::new();
        match self.checks {
            0 => self.no_check_moves(tables, position, phase, &mut queue),
            1 => self.single_check_moves(tables, position, phase, &mut queue),
            _ => self.double_check_moves(tables, position, phase, &mut queue),
        }
        self.checkmate = self.checks > 0 && queue.is_empty();
        self.stalemate = self.checks == 0 && queue.is_empty();
        queue
    }

    /// Control, check and pin survey of the waiting side. With a context,
    /// also accumulates the waiting side's piece-square total and bishop
    /// pair bonus for the leaf evaluation.
    pub fn survey_waiting_side(
        &mut self,
        tables: &AttackTables,
        position: &Position,
        phase: Phase,
        context: Option<&mut EvalContext>,
    ) {
        self.control = 0;
        self.check_map = 0;
        self.checks = 0;
        self.pins = [0; 64];
        self.checkmate = false;
        self.stalemate = false;

        let king_mask = position.mover().king_mask;
        let king_square = position.mover().king_square;
        let waiting = position.waiting();
        let tallying = context.is_some();
        let mut total = 0i32;
        let mut bishops = 0u32;

        for (square, kind) in waiting.pieces() {
            let control = match kind.class_index() {
                0 => {
                    let control = tables.pawn_control(kind.color(), square);
                    if control & king_mask != 0 {
                        self.checks += 1;
                        self.check_map = bit(square);
                    }
                    control
                }
                1 => {
                    let control = tables.knight_control[square as usize];
                    if control & king_mask != 0 {
                        self.checks += 1;
                        self.check_map = bit(square);
                    }
                    control
                }
                2 => self.bishop_control(tables, position, square, king_mask, king_square),
                3 => self.rook_control(tables, position, square, king_mask, king_square),
                4 => {
                    self.rook_control(tables, position, square, king_mask, king_square)
                        | self.bishop_control(tables, position, square, king_mask, king_square)
                }
                _ => tables.king_control[square as usize],
            };
            self.control |= control;

            if tallying {
                total += eval_tables::piece_square(phase, kind, square);
                if kind.is_bishop() {
                    bishops += 1;
                }
            }
        }

        if let Some(context) = context {
            let mut sum = total as f32;
            if bishops > 1 {
                sum += crate::search::evaluate::BISHOP_PAIR_BONUS;
            }
            match waiting.color {
                Color::White => context.white_pieces_eval = sum,
                Color::Black => context.black_pieces_eval = sum,
            }
        }
    }

    /// Short-circuit probe: does the side to move have any legal move? Uses
    /// the state of the last survey and sets the terminal flags like
    /// `generate` would, without building the queue.
    pub fn moving_side_has_move(&mut self, tables: &AttackTables, position: &Position) -> bool {
        let mover = position.mover();
        let own = mover.occupied;
        let enemy = position.waiting().occupied;

        match self.checks {
            0 => {
                for (square, kind) in mover.pieces() {
                    let pin = self.pin_mask(square);
                    let targets = match kind.class_index() {
                        0 => {
                            let captures = (enemy | position.en_passant)
                                & tables.pawn_control(kind.color(), square);
                            (captures | pawn_pushes(tables, position, kind.color(), square)) & pin
                        }
                        1 => tables.knight_control[square as usize] & !own & pin,
                        2 => tables.bishop_attacks(square, position.occupancy) & !own & pin,
                        3 => tables.rook_attacks(square, position.occupancy) & !own & pin,
                        4 => {
                            (tables.rook_attacks(square, position.occupancy)
                                | tables.bishop_attacks(square, position.occupancy))
                                & !own
                                & pin
                        }
                        _ => tables.king_control[square as usize] & !own & !self.control,
                    };
                    if targets != 0 {
                        return true;
                    }
                }
                self.stalemate = true;
                false
            }
            1 => {
                let check_map = self.check_map;
                let ep_capture = self.en_passant_resolving_check(position);
                for (square, kind) in mover.pieces() {
                    let targets = if kind.is_king() {
                        tables.king_control[square as usize] & !own & !self.control
                    } else if self.pins[square as usize] != 0 {
                        0
                    } else {
                        match kind.class_index() {
                            0 => {
                                let control = tables.pawn_control(kind.color(), square);
                                ((enemy & check_map) | ep_capture) & control
                                    | (pawn_pushes(tables, position, kind.color(), square)
                                        & check_map)
                            }
                            1 => tables.knight_control[square as usize] & check_map,
                            2 => tables.bishop_attacks(square, position.occupancy) & check_map,
                            3 => tables.rook_attacks(square, position.occupancy) & check_map,
                            _ => {
                                (tables.rook_attacks(square, position.occupancy)
                                    | tables.bishop_attacks(square, position.occupancy))
                                    & check_map
                            }
                        }
                    };
                    if targets != 0 {
                        return true;
                    }
                }
                self.checkmate = true;
                false
            }
            _ => {
                let king = mover.king_square;
                let targets = tables.king_control[king as usize] & !own & !self.control;
                if targets == 0 {
                    self.checkmate = true;
                }
                targets != 0
            }
        }
    }

    #[inline]
    fn pin_mask(&self, square: Square) -> Bitboard {
        match self.pins[square as usize] {
            0 => !0,
            mask => mask,
        }
    }

    /// The en-passant target as a capture mask, but only when taking it
    /// removes the checking pawn.
    fn en_passant_resolving_check(&self, position: &Position) -> Bitboard {
        if position.en_passant == 0 {
            return 0;
        }
        let resolves = match position.turn {
            Color::White => self.check_map == position.en_passant << 8,
            Color::Black => self.check_map == position.en_passant >> 8,
        };
        if resolves {
            position.en_passant
        } else {
            0
        }
    }

    fn no_check_moves(
        &mut self,
        tables: &AttackTables,
        position: &Position,
        phase: Phase,
        queue: &mut MoveQueue,
    ) {
        let mover = position.mover();
        let own = mover.occupied;
        let enemy = position.waiting().occupied;

        for (square, kind) in mover.pieces() {
            let pin = self.pin_mask(square);
            match kind.class_index() {
                0 => {
                    let captures =
                        (enemy | position.en_passant) & tables.pawn_control(kind.color(), square);
                    let pushes = pawn_pushes(tables, position, kind.color(), square);
                    self.pawn_scan(position, phase, square, (captures | pushes) & pin, queue);
                }
                1 => {
                    let targets = tables.knight_control[square as usize] & !own & pin;
                    self.piece_scan(position, phase, kind, square, targets, queue);
                }
                2 => {
                    let targets = tables.bishop_attacks(square, position.occupancy) & !own & pin;
                    self.piece_scan(position, phase, kind, square, targets, queue);
                }
                3 => {
                    let targets = tables.rook_attacks(square, position.occupancy) & !own & pin;
                    self.piece_scan(position, phase, kind, square, targets, queue);
                }
                4 => {
                    let targets = (tables.rook_attacks(square, position.occupancy)
                        | tables.bishop_attacks(square, position.occupancy))
                        & !own
                        & pin;
                    self.piece_scan(position, phase, kind, square, targets, queue);
                }
                _ => self.king_scan(
                    tables,
                    position,
                    phase,
                    kind,
                    square,
                    mover.castling_rights,
                    queue,
                ),
            }
        }
    }

    fn single_check_moves(
        &mut self,
        tables: &AttackTables,
        position: &Position,
        phase: Phase,
        queue: &mut MoveQueue,
    ) {
        let mover = position.mover();
        let enemy = position.waiting().occupied;
        let check_map = self.check_map;
        let ep_capture = self.en_passant_resolving_check(position);

        for (square, kind) in mover.pieces() {
            if kind.is_king() {
                self.king_scan(tables, position, phase, kind, square, 0, queue);
                continue;
            }
            // A pinned piece can never resolve a check.
            if self.pins[square as usize] != 0 {
                continue;
            }
            match kind.class_index() {
                0 => {
                    let control = tables.pawn_control(kind.color(), square);
                    let captures = ((enemy & check_map) | ep_capture) & control;
                    let pushes =
                        pawn_pushes(tables, position, kind.color(), square) & check_map;
                    self.pawn_scan(position, phase, square, captures | pushes, queue);
                }
                1 => {
                    let targets = tables.knight_control[square as usize] & check_map;
                    self.piece_scan(position, phase, kind, square, targets, queue);
                }
                2 => {
                    let targets = tables.bishop_attacks(square, position.occupancy) & check_map;
                    self.piece_scan(position, phase, kind, square, targets, queue);
                }
                3 => {
                    let targets = tables.rook_attacks(square, position.occupancy) & check_map;
                    self.piece_scan(position, phase, kind, square, targets, queue);
                }
                _ => {
                    let targets = (tables.rook_attacks(square, position.occupancy)
                        | tables.bishop_attacks(square, position.occupancy))
                        & check_map;
                    self.piece_scan(position, phase, kind, square, targets, queue);
                }
            }
        }
    }

    fn double_check_moves(
        &mut self,
        tables: &AttackTables,
        position: &Position,
        phase: Phase,
        queue: &mut MoveQueue,
    ) {
        let mover = position.mover();
        let kind = match position.turn {
            Color::White => PieceKind::WhiteKing,
            Color::Black => PieceKind::BlackKing,
        };
        self.king_scan(tables, position, phase, kind, mover.king_square, 0, queue);
    }

    fn king_scan(
        &self,
        tables: &AttackTables,
        position: &Position,
        phase: Phase,
        kind: PieceKind,
        origin: Square,
        castling_rights: u8,
        queue: &mut MoveQueue,
    ) {
        let mover = position.mover();
        let targets = tables.king_control[origin as usize] & !mover.occupied & !self.control;
        self.piece_scan(position, phase, kind, origin, targets, queue);

        if castling_rights & SHORT_CASTLE != 0
            && mover.castle_short_span & position.occupancy == 0
            && mover.castle_short_span & self.control == 0
        {
            queue.enqueue(Move::new(
                origin,
                origin + 2,
                MoveType::CastleShort,
                rating::CASTLE_SHORT_RATING,
            ));
        }
        if castling_rights & LONG_CASTLE != 0
            && mover.castle_long_span & position.occupancy == 0
            && mover.castle_long_control_span & self.control == 0
        {
            queue.enqueue(Move::new(
                origin,
                origin - 2,
                MoveType::CastleLong,
                rating::CASTLE_LONG_RATING,
            ));
        }
    }

    fn piece_scan(
        &self,
        position: &Position,
        phase: Phase,
        kind: PieceKind,
        origin: Square,
        targets: Bitboard,
        queue: &mut MoveQueue,
    ) {
        for destination in BitIter(targets) {
            queue.enqueue(Move::new(
                origin,
                destination,
                MoveType::Quiet,
                rating::rate_move(position, phase, kind, destination),
            ));
        }
    }

    fn pawn_scan(
        &self,
        position: &Position,
        phase: Phase,
        origin: Square,
        targets: Bitboard,
        queue: &mut MoveQueue,
    ) {
        let (pawn, last_rank): (PieceKind, fn(Square) -> bool) = match position.turn {
            Color::White => (PieceKind::WhitePawn, |square| square < 8),
            Color::Black => (PieceKind::BlackPawn, |square| square > 55),
        };
        for destination in BitIter(targets) {
            if last_rank(destination) {
                for kind in [
                    MoveType::PromoteKnight,
                    MoveType::PromoteBishop,
                    MoveType::PromoteRook,
                    MoveType::PromoteQueen,
                ] {
                    queue.enqueue(Move::new(
                        origin,
                        destination,
                        kind,
                        rating::rate_promotion(kind),
                    ));
                }
            } else {
                let kind = if bit(destination) == position.en_passant {
                    match position.turn {
                        Color::White => MoveType::EnPassantWhite,
                        Color::Black => MoveType::EnPassantBlack,
                    }
                } else {
                    MoveType::Quiet
                };
                queue.enqueue(Move::new(
                    origin,
                    destination,
                    kind,
                    rating::rate_move(position, phase, pawn, destination),
                ));
            }
        }
    }

    /// Rook-line control for a waiting slider, with check and pin detection.
    fn rook_control(
        &mut self,
        tables: &AttackTables,
        position: &Position,
        origin: Square,
        king_mask: Bitboard,
        king_square: Square,
    ) -> Bitboard {
        let control = tables.rook_attacks(origin, position.occupancy & !king_mask);
        if control & king_mask != 0 {
            self.checks += 1;
            let from_slider = tables.rook_attacks(origin, position.occupancy);
            let from_king = tables.rook_attacks(king_square, position.occupancy);
            self.check_map = (from_slider & from_king) | bit(origin);
            return control;
        }
        if tables.rook_free[origin as usize] & king_mask != 0 {
            let from_king = tables.rook_attacks(king_square, position.occupancy);
            let blocker = from_king & control;
            if blocker != 0 && blocker & position.mover().occupied != 0 {
                let square = blocker.trailing_zeros() as usize;
                self.pins[square] = (tables.rook_free[king_square as usize]
                    & tables.rook_free[origin as usize])
                    | bit(origin);
            }
        }
        control
    }

    /// Bishop-line counterpart of [`Self::rook_control`].
    fn bishop_control(
        &mut self,
        tables: &AttackTables,
        position: &Position,
        origin: Square,
        king_mask: Bitboard,
        king_square: Square,
    ) -> Bitboard {
        let control = tables.bishop_attacks(origin, position.occupancy & !king_mask);
        if control & king_mask != 0 {
            self.checks += 1;
            let from_slider = tables.bishop_attacks(origin, position.occupancy);
            let from_king = tables.bishop_attacks(king_square, position.occupancy);
            self.check_map = (from_slider & from_king) | bit(origin);
            return control;
        }
        if tables.bishop_free[origin as usize] & king_mask != 0 {
            let from_king = tables.bishop_attacks(king_square, position.occupancy);
            let blocker = from_king & control;
            if blocker != 0 && blocker & position.mover().occupied != 0 {
                let square = blocker.trailing_zeros() as usize;
                self.pins[square] = (tables.bishop_free[king_square as usize]
                    & tables.bishop_free[origin as usize])
                    | bit(origin);
            }
        }
        control
    }
}

impl Default for MoveGenerator {
    fn default() -> MoveGenerator {
        MoveGenerator::new()
    }
}

/// Open push targets for a pawn; the double push requires the single push
/// square to be free as well.
fn pawn_pushes(
    tables: &AttackTables,
    position: &Position,
    color: Color,
    square: Square,
) -> Bitboard {
    let push = tables.pawn_push(color, square);
    if push == 0 {
        return 0;
    }
    let front = match color {
        Color::White => square - 8,
        Color::Black => square + 8,
    };
    if bit(front) & position.occupancy != 0 {
        return 0;
    }
    push & !position.occupancy
}
