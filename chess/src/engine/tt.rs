//! Transposition table

use super::eval::Score;
use crate::moves::Move;

use std::collections::TryReserveError;

use log::debug;
use thiserror::Error;

/// Error creating a [`TranspositionTable`]
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum TableError {
    /// Size in bits is out of range
    #[error("table size must be between 1 and 32 bits, got {0}")]
    BadSize(u32),
    /// Not enough memory for the table
    #[error("cannot allocate table: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Kind of score stored in the table
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Bound {
    /// Score is exact
    Exact,
    /// Search failed high, real score is at least the stored one
    Lower,
    /// Search failed low, real score is at most the stored one
    Upper,
}

/// Search result cached for a position
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Depth of the search which produced the entry
    pub depth: u8,
    pub score: Score,
    pub bound: Bound,
    /// Best move found in the position, if any
    pub mv: Option<Move>,
}

/// Table usage counters
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TableStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
}

#[derive(Debug, Copy, Clone)]
struct Slot {
    key: u64,
    generation: u8,
    entry: Entry,
}

/// Fixed-size hash table from Zobrist keys to search results
///
/// The table has `2^bits` slots and is never resized. A key is stored in the slot given by
/// its low bits. The whole key is kept in the slot, so [`TranspositionTable::probe()`] never
/// returns an entry stored for another position, though a stored entry may be lost after
/// being overwritten.
///
/// An existing entry is overwritten unless it's deeper than the new one and was written
/// during the current search. Call [`TranspositionTable::new_search()`] before each search
/// so older entries become replaceable.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    slots: Box<[Option<Slot>]>,
    mask: u64,
    generation: u8,
    stats: TableStats,
}

impl TranspositionTable {
    pub const MIN_BITS: u32 = 1;
    pub const MAX_BITS: u32 = 32;

    /// Creates an empty table with `2^bits` slots
    pub fn new(bits: u32) -> Result<TranspositionTable, TableError> {
        if !(Self::MIN_BITS..=Self::MAX_BITS).contains(&bits) {
            return Err(TableError::BadSize(bits));
        }
        let len = 1_usize << bits;
        let mut slots = Vec::new();
        slots.try_reserve_exact(len)?;
        slots.resize(len, None);
        debug!(
            "allocated transposition table with {} slots ({} bytes)",
            len,
            len * std::mem::size_of::<Option<Slot>>()
        );
        Ok(TranspositionTable {
            slots: slots.into_boxed_slice(),
            mask: (len - 1) as u64,
            generation: 0,
            stats: TableStats::default(),
        })
    }

    /// Number of slots
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    #[inline]
    pub fn stats(&self) -> TableStats {
        self.stats
    }

    /// Marks all the existing entries as belonging to older searches
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Removes all the entries and resets the counters
    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.generation = 0;
        self.stats = TableStats::default();
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key & self.mask) as usize
    }

    /// Looks up the entry stored for `key`
    pub fn probe(&mut self, key: u64) -> Option<Entry> {
        self.stats.probes += 1;
        let slot = self.slots[self.index(key)].as_ref()?;
        if slot.key != key {
            return None;
        }
        self.stats.hits += 1;
        Some(slot.entry)
    }

    /// Stores the search result for `key`, possibly replacing another entry in its slot
    pub fn store(&mut self, key: u64, depth: u8, score: Score, bound: Bound, mv: Option<Move>) {
        self.stats.stores += 1;
        let generation = self.generation;
        let idx = self.index(key);
        if let Some(old) = &self.slots[idx] {
            if old.generation == generation && old.entry.depth > depth {
                return;
            }
        }
        self.slots[idx] = Some(Slot {
            key,
            generation,
            entry: Entry {
                depth,
                score,
                bound,
                mv,
            },
        });
    }

    /// Fraction of occupied slots in the first thousand, in permille
    pub fn hashfull(&self) -> usize {
        self.slots.iter().take(1000).filter(|s| s.is_some()).count() * 1000
            / self.slots.len().min(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_size() {
        assert_eq!(TranspositionTable::new(0).unwrap_err(), TableError::BadSize(0));
        assert_eq!(TranspositionTable::new(40).unwrap_err(), TableError::BadSize(40));
        let t = TranspositionTable::new(4).unwrap();
        assert_eq!(t.len(), 16);
        assert!(t.is_empty());
        assert_eq!(t.hashfull(), 0);
    }

    #[test]
    fn test_store_probe() {
        let mut t = TranspositionTable::new(8).unwrap();
        assert_eq!(t.probe(42), None);
        t.store(42, 3, -15, Bound::Lower, None);
        assert_eq!(
            t.probe(42),
            Some(Entry {
                depth: 3,
                score: -15,
                bound: Bound::Lower,
                mv: None
            })
        );
        // Same slot, other key
        assert_eq!(t.probe(42 + 256), None);
        assert_eq!(
            t.stats(),
            TableStats {
                probes: 3,
                hits: 1,
                stores: 1
            }
        );
    }

    #[test]
    fn test_replace() {
        let mut t = TranspositionTable::new(4).unwrap();
        t.store(5, 6, 100, Bound::Exact, None);
        t.store(5 + 16, 2, 7, Bound::Upper, None);
        assert_eq!(t.probe(5).map(|e| e.score), Some(100));
        assert_eq!(t.probe(5 + 16), None);

        t.store(5 + 16, 6, 7, Bound::Upper, None);
        assert_eq!(t.probe(5), None);
        assert_eq!(t.probe(5 + 16).map(|e| e.score), Some(7));

        t.new_search();
        t.store(5 + 32, 1, 9, Bound::Exact, None);
        assert_eq!(t.probe(5 + 32).map(|e| e.depth), Some(1));

        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.stats(), TableStats::default());
    }

    #[test]
    fn test_no_aliasing() {
        let mut rng = StdRng::seed_from_u64(0x7474_7474);
        let mut t = TranspositionTable::new(6).unwrap();
        let keys: Vec<u64> = (0..512).map(|_| rng.gen()).collect();
        let score_of = |key: u64| (key % 2000) as Score - 1000;
        for round in 0..20 {
            for _ in 0..300 {
                let key = keys[rng.gen_range(0..keys.len())];
                let depth = rng.gen_range(0..10);
                t.store(key, depth, score_of(key), Bound::Exact, None);
            }
            for &key in &keys {
                if let Some(entry) = t.probe(key) {
                    assert_eq!(entry.score, score_of(key), "round {}", round);
                }
            }
            for _ in 0..1000 {
                let key: u64 = rng.gen();
                if let Some(entry) = t.probe(key) {
                    assert!(keys.contains(&key));
                    assert_eq!(entry.score, score_of(key));
                }
            }
            t.new_search();
        }
        assert!(t.stats().hits > 0);
    }
}
