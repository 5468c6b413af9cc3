//! Crate root module declarations for the Quince Chess engine.
//!
//! This file exposes the four subsystems (board representation, move
//! generation, search, and the GUI protocol) so the binary, tests, and
//! benches can import stable module paths.

pub mod board {
    pub mod attack_tables;
    pub mod masks;
    pub mod piece_group;
    pub mod position;
    pub mod types;
    pub mod zobrist;
}

pub mod movegen {
    pub mod generator;
    pub mod move_queue;
    pub mod perft;
    pub mod rating;
}

pub mod search {
    pub mod control;
    pub mod engine;
    pub mod eval_tables;
    pub mod evaluate;
    pub mod transposition;
}

pub mod protocol {
    pub mod channel;
    pub mod encode;
    pub mod session;
}

/// Shared fixtures for the test suite: the attack tables take a moment to
/// build, so every test module borrows one instance.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, OnceLock};

    use crate::board::attack_tables::AttackTables;
    use crate::board::zobrist::ZobristKeys;

    static TABLES: OnceLock<Arc<AttackTables>> = OnceLock::new();
    static KEYS: OnceLock<Arc<ZobristKeys>> = OnceLock::new();

    fn tables_cell() -> &'static Arc<AttackTables> {
        TABLES.get_or_init(|| {
            Arc::new(AttackTables::new().expect("attack table construction succeeds"))
        })
    }

    fn keys_cell() -> &'static Arc<ZobristKeys> {
        KEYS.get_or_init(|| Arc::new(ZobristKeys::default()))
    }

    pub fn tables() -> &'static AttackTables {
        tables_cell()
    }

    pub fn keys() -> &'static ZobristKeys {
        keys_cell()
    }

    pub fn shared_tables() -> Arc<AttackTables> {
        Arc::clone(tables_cell())
    }

    pub fn shared_keys() -> Arc<ZobristKeys> {
        Arc::clone(keys_cell())
    }
}
