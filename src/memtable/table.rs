//! MemTable implementation
//!
//! Red-black tree index plus size bookkeeping. The engine owns the memtable
//! behind its own lock, so this type has no interior locking.

use crate::entry::Entry;

use super::rbtree::{Iter, RbTree};

/// In-memory table for recent writes
#[derive(Debug, Default)]
pub struct MemTable {
    /// Ordered index of live entries
    index: RbTree,

    /// Approximate size in bytes (keys + values)
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.index.get(key)
    }

    /// Put a key-value pair, returning the entry count afterwards
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let key_len = key.len();
        let value_len = value.len();

        match self.index.insert(key, value) {
            Some(old) => {
                self.size = self.size - old.len() + value_len;
            }
            None => {
                self.size += key_len + value_len;
            }
        }

        self.index.len()
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check if the entry count has reached the flush threshold
    pub fn should_flush(&self, threshold: usize) -> bool {
        self.index.len() >= threshold
    }

    /// Snapshot of all entries (for flush), in key order
    pub fn entries(&self) -> Vec<Entry> {
        self.index.to_entries()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> Iter<'_> {
        self.index.iter()
    }

    /// Access the underlying index (for invariant checks)
    pub fn index(&self) -> &RbTree {
        &self.index
    }
}
