//! Move representation and the rating-ordered move queue.

use crate::board::types::{bit, Bitboard, Color, PieceKind, Square};

/// Move classification, matching the protocol type digits 0..=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveType {
    Quiet,
    PromoteKnight,
    PromoteBishop,
    PromoteRook,
    PromoteQueen,
    CastleShort,
    CastleLong,
    /// White captures en passant; the captured pawn is below the target.
    EnPassantWhite,
    /// Black captures en passant; the captured pawn is above the target.
    EnPassantBlack,
}

impl MoveType {
    #[inline]
    pub const fn digit(self) -> u8 {
        self as u8
    }

    pub fn from_digit(digit: u8) -> Option<MoveType> {
        const ALL: [MoveType; 9] = [
            MoveType::Quiet,
            MoveType::PromoteKnight,
            MoveType::PromoteBishop,
            MoveType::PromoteRook,
            MoveType::PromoteQueen,
            MoveType::CastleShort,
            MoveType::CastleLong,
            MoveType::EnPassantWhite,
            MoveType::EnPassantBlack,
        ];
        ALL.get(digit as usize).copied()
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        matches!(
            self,
            MoveType::PromoteKnight
                | MoveType::PromoteBishop
                | MoveType::PromoteRook
                | MoveType::PromoteQueen
        )
    }

    /// The piece a promotion move produces for the given color.
    pub fn promotion_kind(self, color: Color) -> Option<PieceKind> {
        let class = match self {
            MoveType::PromoteKnight => 1,
            MoveType::PromoteBishop => 2,
            MoveType::PromoteRook => 3,
            MoveType::PromoteQueen => 4,
            _ => return None,
        };
        PieceKind::with_color(class, color)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub origin: Square,
    pub destination: Square,
    pub kind: MoveType,
    /// Origin and destination bits combined.
    pub mask: Bitboard,
    pub rating: i32,
}

impl Move {
    #[inline]
    pub fn new(origin: Square, destination: Square, kind: MoveType, rating: i32) -> Move {
        Move {
            origin,
            destination,
            kind,
            mask: bit(origin) | bit(destination),
            rating,
        }
    }
}

/// Array-backed max-heap of moves keyed by rating. Storage is 1-indexed so
/// the parent of node `n` is `n / 2`.
#[derive(Debug, Clone)]
pub struct MoveQueue {
    heap: Vec<Move>,
}

impl MoveQueue {
    pub fn new() -> MoveQueue {
        let mut heap = Vec::with_capacity(64);
        // Slot 0 is never read.
        heap.push(Move::new(0, 0, MoveType::Quiet, 0));
        MoveQueue { heap }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn enqueue(&mut self, mv: Move) {
        self.heap.push(mv);
        self.queue_up(self.heap.len() - 1);
    }

    /// Removes and returns the highest-rated move.
    pub fn dequeue(&mut self) -> Option<Move> {
        if self.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(1, last);
        let best = self.heap.pop();
        if self.len() > 1 {
            self.queue_down(1);
        }
        best
    }

    fn queue_up(&mut self, mut at: usize) {
        while at > 1 && self.heap[at / 2].rating < self.heap[at].rating {
            self.heap.swap(at / 2, at);
            at /= 2;
        }
    }

    fn queue_down(&mut self, mut at: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * at;
            let right = left + 1;
            let mut largest = at;
            if left < len && self.heap[left].rating > self.heap[largest].rating {
                largest = left;
            }
            if right < len && self.heap[right].rating > self.heap[largest].rating {
                largest = right;
            }
            if largest == at {
                return;
            }
            self.heap.swap(at, largest);
            at = largest;
        }
    }
}

impl Default for MoveQueue {
    fn default() -> MoveQueue {
        MoveQueue::new()
    }
}
