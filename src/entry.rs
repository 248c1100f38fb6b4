//! Entry model
//!
//! Keys and values are plain byte sequences ordered lexicographically.

use std::cmp::Ordering;

/// Key bytes
pub type Key = Vec<u8>;

/// Value bytes
pub type Value = Vec<u8>;

/// Key ordering used by the memtable index
pub type Comparator = fn(&[u8], &[u8]) -> Ordering;

/// Lexicographic byte comparison (shorter prefix sorts first)
pub fn compare_keys(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// A key/value pair, the unit stored in both the memtable and segments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub key: Key,
    pub value: Value,
}

impl Entry {
    pub fn new(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Key plus value length in bytes
    pub fn size(&self) -> usize {
        self.key.len() + self.value.len()
    }
}

impl From<(&[u8], &[u8])> for Entry {
    fn from((key, value): (&[u8], &[u8])) -> Self {
        Self::new(key, value)
    }
}
