//! Primitive board types shared across the crate.
//!
//! Squares are numbered row-major from the top of the board as White sees it:
//! 0 = a8, 7 = h8, 56 = a1, 63 = h1. White pawns therefore push toward lower
//! indices. The protocol encoding relies on this layout.

/// Square index, 0..=63.
pub type Square = u8;

/// One bit per square, bit `n` = square `n`.
pub type Bitboard = u64;

/// Single-square bitboard.
#[inline]
pub const fn bit(square: Square) -> Bitboard {
    1u64 << square
}

/// Iterates the set squares of a bitboard, lowest index first.
pub struct BitIter(pub Bitboard);

impl Iterator for BitIter {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        let square = self.0.trailing_zeros() as Square;
        self.0 &= self.0 - 1;
        Some(square)
    }
}

/// Castling rights bit for queenside castling.
pub const LONG_CASTLE: u8 = 1;
/// Castling rights bit for kingside castling.
pub const SHORT_CASTLE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    pub const fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

/// Piece kinds for both colors, indexed 0..=11.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    WhitePawn,
    WhiteKnight,
    WhiteBishop,
    WhiteRook,
    WhiteQueen,
    WhiteKing,
    BlackPawn,
    BlackKnight,
    BlackBishop,
    BlackRook,
    BlackQueen,
    BlackKing,
}

/// Material values per kind index: pawn 10, knight 30, bishop 35, rook 50,
/// queen 90, king 0.
pub const MATERIAL_VALUES: [i32; 12] = [10, 30, 35, 50, 90, 0, 10, 30, 35, 50, 90, 0];

impl PieceKind {
    pub const ALL: [PieceKind; 12] = [
        PieceKind::WhitePawn,
        PieceKind::WhiteKnight,
        PieceKind::WhiteBishop,
        PieceKind::WhiteRook,
        PieceKind::WhiteQueen,
        PieceKind::WhiteKing,
        PieceKind::BlackPawn,
        PieceKind::BlackKnight,
        PieceKind::BlackBishop,
        PieceKind::BlackRook,
        PieceKind::BlackQueen,
        PieceKind::BlackKing,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Kind index with the color stripped, 0..=5.
    #[inline]
    pub const fn class_index(self) -> usize {
        self.index() % 6
    }

    #[inline]
    pub const fn color(self) -> Color {
        if self.index() < 6 {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<PieceKind> {
        PieceKind::ALL.get(index).copied()
    }

    /// The kind with the same class but the given color.
    #[inline]
    pub fn with_color(class_index: usize, color: Color) -> Option<PieceKind> {
        PieceKind::from_index(class_index + 6 * color.index())
    }

    #[inline]
    pub const fn material_value(self) -> i32 {
        MATERIAL_VALUES[self.index()]
    }

    #[inline]
    pub const fn is_pawn(self) -> bool {
        self.class_index() == 0
    }

    #[inline]
    pub const fn is_knight(self) -> bool {
        self.class_index() == 1
    }

    #[inline]
    pub const fn is_bishop(self) -> bool {
        self.class_index() == 2
    }

    #[inline]
    pub const fn is_rook(self) -> bool {
        self.class_index() == 3
    }

    #[inline]
    pub const fn is_queen(self) -> bool {
        self.class_index() == 4
    }

    #[inline]
    pub const fn is_king(self) -> bool {
        self.class_index() == 5
    }
}
