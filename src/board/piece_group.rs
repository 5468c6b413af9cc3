//! One side's pieces and their aggregate state.

use crate::board::types::{
    bit, BitIter, Bitboard, Color, PieceKind, Square, LONG_CASTLE, SHORT_CASTLE,
};
use crate::board::zobrist::ZobristKeys;

/// All pieces of one color: per-square kinds, aggregate bitboard, castling
/// state and the material counters the evaluation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceGroup {
    pub color: Color,
    squares: [Option<PieceKind>; 64],
    pub occupied: Bitboard,
    pub king_mask: Bitboard,
    pub king_square: Square,
    /// `LONG_CASTLE` and/or `SHORT_CASTLE` bits.
    pub castling_rights: u8,
    /// Total material value, pawns included.
    pub material: i32,
    /// Material value excluding pawns, drives phase detection.
    pub piece_material: i32,
    pub piece_count: u8,
    pub pawn_count: u8,
    pub knight_count: u8,
    /// Squares that must be empty for kingside castling.
    pub castle_short_span: Bitboard,
    /// Squares that must be empty for queenside castling.
    pub castle_long_span: Bitboard,
    /// Squares the king crosses queenside, which must be uncontrolled.
    pub castle_long_control_span: Bitboard,
    kingside_rook_mask: Bitboard,
    queenside_rook_mask: Bitboard,
    rook_corner_king_hash: u64,
    rook_corner_queen_hash: u64,
    rook_castled_short_hash: u64,
    rook_castled_long_hash: u64,
}

impl PieceGroup {
    /// Builds the group for `color` from a full-board layout. The layout is
    /// expected to contain this color's king.
    pub fn new(
        layout: &[Option<PieceKind>; 64],
        color: Color,
        castling_rights: u8,
        keys: &ZobristKeys,
    ) -> PieceGroup {
        let rook = match color {
            Color::White => PieceKind::WhiteRook,
            Color::Black => PieceKind::BlackRook,
        };
        // Corner and castled rook squares, top-down layout: black back rank
        // is row 0, white back rank is row 7.
        let (queen_corner, king_corner, castled_long, castled_short) = match color {
            Color::White => (56u8, 63u8, 59u8, 61u8),
            Color::Black => (0u8, 7u8, 3u8, 5u8),
        };
        let (short_span, long_span, long_control) = match color {
            Color::White => (
                bit(61) | bit(62),
                bit(57) | bit(58) | bit(59),
                bit(58) | bit(59),
            ),
            Color::Black => (bit(5) | bit(6), bit(1) | bit(2) | bit(3), bit(2) | bit(3)),
        };

        let mut group = PieceGroup {
            color,
            squares: [None; 64],
            occupied: 0,
            king_mask: 0,
            king_square: 0,
            castling_rights,
            material: 0,
            piece_material: 0,
            piece_count: 0,
            pawn_count: 0,
            knight_count: 0,
            castle_short_span: short_span,
            castle_long_span: long_span,
            castle_long_control_span: long_control,
            kingside_rook_mask: bit(king_corner),
            queenside_rook_mask: bit(queen_corner),
            rook_corner_king_hash: keys.piece_key(rook, king_corner),
            rook_corner_queen_hash: keys.piece_key(rook, queen_corner),
            rook_castled_short_hash: keys.piece_key(rook, castled_short),
            rook_castled_long_hash: keys.piece_key(rook, castled_long),
        };

        for (square, kind) in layout.iter().enumerate() {
            if let Some(kind) = kind {
                if kind.color() == color {
                    group.add_piece(square as Square, *kind);
                }
            }
        }

        group
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<PieceKind> {
        self.squares[square as usize]
    }

    /// Iterates `(square, kind)` for every piece in the group.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, PieceKind)> + '_ {
        BitIter(self.occupied).filter_map(move |square| {
            self.squares[square as usize].map(|kind| (square, kind))
        })
    }

    pub fn add_piece(&mut self, square: Square, kind: PieceKind) {
        self.squares[square as usize] = Some(kind);
        self.occupied |= bit(square);
        self.material += kind.material_value();
        self.piece_count += 1;
        if kind.is_pawn() {
            self.pawn_count += 1;
        } else {
            self.piece_material += kind.material_value();
            if kind.is_knight() {
                self.knight_count += 1;
            }
        }
        if kind.is_king() {
            self.king_mask = bit(square);
            self.king_square = square;
        }
    }

    /// Removes the piece on `square`, stripping the matching castling right
    /// when a corner rook square is vacated.
    pub fn remove_piece(&mut self, square: Square) -> Option<PieceKind> {
        let kind = self.squares[square as usize].take()?;
        let mask = bit(square);
        self.occupied ^= mask;
        self.material -= kind.material_value();
        self.piece_count -= 1;
        if kind.is_pawn() {
            self.pawn_count -= 1;
        } else {
            self.piece_material -= kind.material_value();
            if kind.is_knight() {
                self.knight_count -= 1;
            }
        }
        if mask == self.kingside_rook_mask {
            self.castling_rights &= !SHORT_CASTLE;
        } else if mask == self.queenside_rook_mask {
            self.castling_rights &= !LONG_CASTLE;
        }
        Some(kind)
    }

    /// Moves a piece between squares, updating king tracking and castling
    /// rights. The destination must be empty within this group.
    pub fn update_piece_position(&mut self, origin: Square, destination: Square) {
        let kind = self.squares[origin as usize].take();
        debug_assert!(kind.is_some(), "no piece on origin square {origin}");
        self.squares[destination as usize] = kind;
        let origin_mask = bit(origin);
        self.occupied = (self.occupied ^ origin_mask) | bit(destination);

        if origin_mask == self.kingside_rook_mask {
            self.castling_rights &= !SHORT_CASTLE;
        } else if origin_mask == self.queenside_rook_mask {
            self.castling_rights &= !LONG_CASTLE;
        }

        if let Some(kind) = kind {
            if kind.is_king() {
                self.king_mask = bit(destination);
                self.king_square = destination;
                self.castling_rights = 0;
            }
        }
    }

    /// Swaps the piece on `square` for `new_kind`, keeping every counter
    /// consistent. Used for promotion and its undo.
    pub fn promote(&mut self, square: Square, new_kind: PieceKind) {
        if let Some(old) = self.squares[square as usize] {
            self.material -= old.material_value();
            if old.is_pawn() {
                self.pawn_count -= 1;
            } else {
                self.piece_material -= old.material_value();
                if old.is_knight() {
                    self.knight_count -= 1;
                }
            }
        }
        self.squares[square as usize] = Some(new_kind);
        self.material += new_kind.material_value();
        if new_kind.is_pawn() {
            self.pawn_count += 1;
        } else {
            self.piece_material += new_kind.material_value();
            if new_kind.is_knight() {
                self.knight_count += 1;
            }
        }
    }

    /// Moves the kingside rook next to the castled king. Called with the king
    /// still on its start square; the caller moves the king afterwards.
    pub fn castle_short(&mut self, hash: &mut u64) {
        self.update_piece_position(self.king_square + 3, self.king_square + 1);
        *hash ^= self.rook_corner_king_hash ^ self.rook_castled_short_hash;
    }

    /// Moves the queenside rook next to the castled king.
    pub fn castle_long(&mut self, hash: &mut u64) {
        self.update_piece_position(self.king_square - 4, self.king_square - 1);
        *hash ^= self.rook_corner_queen_hash ^ self.rook_castled_long_hash;
    }

    /// Returns the kingside rook to its corner. Called with the king still on
    /// its castled square.
    pub fn undo_castle_short(&mut self) {
        self.update_piece_position(self.king_square - 1, self.king_square + 1);
    }

    /// Returns the queenside rook to its corner.
    pub fn undo_castle_long(&mut self) {
        self.update_piece_position(self.king_square + 1, self.king_square - 2);
    }
}
