//! The full position aggregate: both piece groups, combined occupancy,
//! en-passant state and the incrementally maintained Zobrist hash, plus
//! make/unmake with a single undo record per ply.

use crate::board::attack_tables::AttackTables;
use crate::board::piece_group::PieceGroup;
use crate::board::types::{bit, Bitboard, Color, PieceKind, Square};
use crate::board::zobrist::ZobristKeys;
use crate::movegen::move_queue::{Move, MoveType};

/// Everything one `unmake` needs that the move itself does not encode.
#[derive(Debug, Clone, Copy)]
struct UndoRecord {
    captured: Option<(Square, PieceKind)>,
    white_castling: u8,
    black_castling: u8,
    en_passant: Bitboard,
    ep_hash_file: Option<u8>,
    hash: u64,
}

#[derive(Debug, Clone)]
pub struct Position {
    pub white: PieceGroup,
    pub black: PieceGroup,
    /// Union of both groups, kept in lockstep.
    pub occupancy: Bitboard,
    pub turn: Color,
    /// Single-bit mask of the en-passant target square, 0 when none.
    pub en_passant: Bitboard,
    /// File whose en-passant key is currently folded into the hash. Only set
    /// while the capture is actually possible.
    ep_hash_file: Option<u8>,
    pub hash: u64,
    undo_stack: Vec<UndoRecord>,
}

impl Position {
    /// Builds a position from a full-board layout. The layout must contain
    /// both kings.
    pub fn from_layout(
        layout: &[Option<PieceKind>; 64],
        turn: Color,
        white_castling: u8,
        black_castling: u8,
        en_passant_square: Option<Square>,
        tables: &AttackTables,
        keys: &ZobristKeys,
    ) -> Position {
        let white = PieceGroup::new(layout, Color::White, white_castling, keys);
        let black = PieceGroup::new(layout, Color::Black, black_castling, keys);
        let mut position = Position {
            occupancy: white.occupied | black.occupied,
            white,
            black,
            turn,
            en_passant: en_passant_square.map(bit).unwrap_or(0),
            ep_hash_file: None,
            hash: 0,
            undo_stack: Vec::with_capacity(64),
        };
        position.ep_hash_file = position.capturable_en_passant_file(tables);
        position.hash = position.compute_hash(tables, keys);
        position
    }

    #[inline]
    pub fn group(&self, color: Color) -> &PieceGroup {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    #[inline]
    fn group_mut(&mut self, color: Color) -> &mut PieceGroup {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// The side to move.
    #[inline]
    pub fn mover(&self) -> &PieceGroup {
        self.group(self.turn)
    }

    /// The side not to move.
    #[inline]
    pub fn waiting(&self) -> &PieceGroup {
        self.group(self.turn.opposite())
    }

    /// Recomputes the hash from scratch. `make` keeps the incremental hash
    /// equal to this at all times.
    pub fn compute_hash(&self, tables: &AttackTables, keys: &ZobristKeys) -> u64 {
        let mut hash = 0;
        for (square, kind) in self.white.pieces().chain(self.black.pieces()) {
            hash ^= keys.piece_key(kind, square);
        }
        hash ^= keys.castling_key(self.white.castling_rights, self.black.castling_rights);
        hash ^= keys.side_key(self.turn);
        if let Some(file) = self.capturable_en_passant_file(tables) {
            hash ^= keys.en_passant_file[file as usize];
        }
        hash
    }

    /// The en-passant file to hash, if the capture is possible for the side
    /// to move. An uncapturable double push does not change position identity.
    fn capturable_en_passant_file(&self, tables: &AttackTables) -> Option<u8> {
        if self.en_passant == 0 {
            return None;
        }
        let target = self.en_passant.trailing_zeros() as Square;
        // The pushed pawn sits between the target and the capturer's side.
        let pawn_square = match self.turn {
            Color::White => target + 8,
            Color::Black => target - 8,
        };
        let capturers = self.group(self.turn);
        let row = pawn_square / 8;
        for neighbor in [pawn_square.wrapping_sub(1), pawn_square + 1] {
            if neighbor < 64 && neighbor / 8 == row {
                if let Some(kind) = capturers.piece_at(neighbor) {
                    if kind.is_pawn()
                        && tables.pawn_control(self.turn, neighbor) & self.en_passant != 0
                    {
                        return Some(target % 8);
                    }
                }
            }
        }
        None
    }

    /// Applies a generated move, updating both groups, occupancy, en-passant
    /// state, turn and hash, and pushes the matching undo record.
    pub fn make(&mut self, mv: &Move, tables: &AttackTables, keys: &ZobristKeys) {
        let mover = self.turn;
        let enemy = mover.opposite();
        let mut record = UndoRecord {
            captured: None,
            white_castling: self.white.castling_rights,
            black_castling: self.black.castling_rights,
            en_passant: self.en_passant,
            ep_hash_file: self.ep_hash_file,
            hash: self.hash,
        };
        let old_castling = (self.white.castling_rights, self.black.castling_rights);
        let mut hash = self.hash;

        // The previous en-passant opportunity expires with this move.
        if let Some(file) = self.ep_hash_file.take() {
            hash ^= keys.en_passant_file[file as usize];
        }

        let piece = self
            .group(mover)
            .piece_at(mv.origin)
            .expect("move origin holds a piece of the side to move");
        hash ^= keys.piece_key(piece, mv.origin) ^ keys.piece_key(piece, mv.destination);

        if let Some(captured) = self.group_mut(enemy).remove_piece(mv.destination) {
            hash ^= keys.piece_key(captured, mv.destination);
            record.captured = Some((mv.destination, captured));
        }

        match mv.kind {
            MoveType::Quiet => {}
            MoveType::PromoteKnight
            | MoveType::PromoteBishop
            | MoveType::PromoteRook
            | MoveType::PromoteQueen => {
                if let Some(promoted) = mv.kind.promotion_kind(mover) {
                    self.group_mut(mover).promote(mv.origin, promoted);
                    let pawn = pawn_of(mover);
                    hash ^=
                        keys.piece_key(pawn, mv.destination) ^ keys.piece_key(promoted, mv.destination);
                }
            }
            MoveType::CastleShort => self.group_mut(mover).castle_short(&mut hash),
            MoveType::CastleLong => self.group_mut(mover).castle_long(&mut hash),
            MoveType::EnPassantWhite => {
                let square = mv.destination + 8;
                if let Some(captured) = self.group_mut(enemy).remove_piece(square) {
                    hash ^= keys.piece_key(captured, square);
                    record.captured = Some((square, captured));
                }
            }
            MoveType::EnPassantBlack => {
                let square = mv.destination - 8;
                if let Some(captured) = self.group_mut(enemy).remove_piece(square) {
                    hash ^= keys.piece_key(captured, square);
                    record.captured = Some((square, captured));
                }
            }
        }

        self.group_mut(mover).update_piece_position(mv.origin, mv.destination);

        self.en_passant = 0;
        if piece.is_pawn() && (mv.origin as i32 - mv.destination as i32).abs() == 16 {
            self.en_passant = bit((mv.origin + mv.destination) / 2);
        }

        self.occupancy = self.white.occupied | self.black.occupied;
        self.turn = enemy;

        self.ep_hash_file = self.capturable_en_passant_file(tables);
        if let Some(file) = self.ep_hash_file {
            hash ^= keys.en_passant_file[file as usize];
        }

        hash ^= keys.castling_key(old_castling.0, old_castling.1)
            ^ keys.castling_key(self.white.castling_rights, self.black.castling_rights);
        hash ^= keys.side_to_move;
        self.hash = hash;

        self.undo_stack.push(record);
        debug_assert_eq!(self.white.occupied & self.black.occupied, 0);
    }

    /// Reverts the most recent `make`. The move must be the one applied last.
    pub fn unmake(&mut self, mv: &Move) {
        let record = match self.undo_stack.pop() {
            Some(record) => record,
            None => {
                debug_assert!(false, "unmake without a matching make");
                return;
            }
        };
        let mover = self.turn.opposite();
        self.turn = mover;

        match mv.kind {
            MoveType::Quiet => {}
            MoveType::PromoteKnight
            | MoveType::PromoteBishop
            | MoveType::PromoteRook
            | MoveType::PromoteQueen => {
                self.group_mut(mover).promote(mv.destination, pawn_of(mover));
            }
            MoveType::CastleShort => self.group_mut(mover).undo_castle_short(),
            MoveType::CastleLong => self.group_mut(mover).undo_castle_long(),
            MoveType::EnPassantWhite | MoveType::EnPassantBlack => {}
        }

        self.group_mut(mover).update_piece_position(mv.destination, mv.origin);

        if let Some((square, kind)) = record.captured {
            self.group_mut(mover.opposite()).add_piece(square, kind);
        }

        self.white.castling_rights = record.white_castling;
        self.black.castling_rights = record.black_castling;
        self.en_passant = record.en_passant;
        self.ep_hash_file = record.ep_hash_file;
        self.hash = record.hash;
        self.occupancy = self.white.occupied | self.black.occupied;
        debug_assert_eq!(self.white.occupied & self.black.occupied, 0);
    }
}

#[inline]
fn pawn_of(color: Color) -> PieceKind {
    match color {
        Color::White => PieceKind::WhitePawn,
        Color::Black => PieceKind::BlackPawn,
    }
}
