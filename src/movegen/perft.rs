//! Legal-move node counting for generator validation and benchmarks.

use crate::board::attack_tables::AttackTables;
use crate::board::position::Position;
use crate::board::zobrist::ZobristKeys;
use crate::movegen::generator::MoveGenerator;
use crate::search::evaluate::Phase;

/// Counts leaf nodes of the legal move tree to the given depth.
pub fn perft(
    tables: &AttackTables,
    keys: &ZobristKeys,
    position: &mut Position,
    depth: u8,
) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut generator = MoveGenerator::new();
    let mut queue = generator.generate(tables, position, Phase::Opening);
    if depth == 1 {
        return queue.len() as u64;
    }
    let mut nodes = 0;
    while let Some(mv) = queue.dequeue() {
        position.make(&mv, tables, keys);
        nodes += perft(tables, keys, position, depth - 1);
        position.unmake(&mv);
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::Color;
    use crate::protocol::encode::layout_from_board;
    use crate::test_support;

    #[test]
    fn depth_zero_counts_the_position_itself() {
        let tables = test_support::tables();
        let keys = test_support::keys();
        let layout = layout_from_board(
            "rnbqkbnrpppppppp00000000000000000000000000000000PPPPPPPPRNBQKBNR",
        )
        .expect("board should parse");
        let mut position = Position::from_layout(&layout, Color::White, 3, 3, None, tables, keys);
        assert_eq!(perft(tables, keys, &mut position, 0), 1);
    }

    #[test]
    fn perft_leaves_the_position_unchanged() {
        let tables = test_support::tables();
        let keys = test_support::keys();
        let layout = layout_from_board(
            "rnbqkbnrpppppppp00000000000000000000000000000000PPPPPPPPRNBQKBNR",
        )
        .expect("board should parse");
        let mut position = Position::from_layout(&layout, Color::White, 3, 3, None, tables, keys);
        let before_hash = position.hash;
        perft(tables, keys, &mut position, 3);
        assert_eq!(position.hash, before_hash);
        assert_eq!(position.turn, Color::White);
    }
}
