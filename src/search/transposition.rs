//! Transposition table mapping Zobrist hashes to leaf scores.
//!
//! The map is allocated when a search begins and released when it ends, so
//! an idle engine holds no table memory. Scores are only ever stored for
//! positions whose evaluation cannot depend on the path that reached them,
//! which in this search means leaves and mates.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: Option<HashMap<u64, f32>>,
}

impl TranspositionTable {
    pub fn new() -> TranspositionTable {
        TranspositionTable { entries: None }
    }

    /// Allocates the backing map for a fresh search.
    pub fn begin_search(&mut self, capacity: usize) {
        self.entries = Some(HashMap::with_capacity(capacity));
    }

    /// Drops the backing map, returning how many entries it held.
    pub fn end_search(&mut self) -> usize {
        self.entries.take().map(|map| map.len()).unwrap_or(0)
    }

    #[inline]
    pub fn probe(&self, hash: u64) -> Option<f32> {
        self.entries.as_ref().and_then(|map| map.get(&hash).copied())
    }

    #[inline]
    pub fn store(&mut self, hash: u64, score: f32) {
        if let Some(map) = self.entries.as_mut() {
            map.insert(hash, score);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_nothing_outside_a_search() {
        let mut table = TranspositionTable::new();
        table.store(42, 1.5);
        assert_eq!(table.probe(42), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn probe_returns_stored_scores_during_a_search() {
        let mut table = TranspositionTable::new();
        table.begin_search(16);
        table.store(42, 1.5);
        table.store(7, -3.0);
        assert_eq!(table.probe(42), Some(1.5));
        assert_eq!(table.probe(7), Some(-3.0));
        assert_eq!(table.probe(9), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn end_search_releases_the_map_and_reports_its_size() {
        let mut table = TranspositionTable::new();
        table.begin_search(16);
        table.store(1, 0.0);
        table.store(2, 0.0);
        assert_eq!(table.end_search(), 2);
        assert_eq!(table.probe(1), None);
        assert!(table.is_empty());
    }
}
