//! Segment Reader
//!
//! Loads a segment fully into memory. Entries are not sorted, so lookups
//! are a linear scan.

use std::fs;
use std::path::Path;

use crate::entry::Entry;
use crate::error::{KeyDbError, Result};

use super::codec;

/// Decoded contents of one segment file
#[derive(Debug)]
pub struct SegmentReader {
    sequence: u64,
    entries: Vec<Entry>,
}

impl SegmentReader {
    /// Read and decode a segment file
    ///
    /// I/O failures become `SegmentRead`, decode failures `SegmentCorruption`,
    /// both tagged with `sequence`.
    pub fn open(path: &Path, sequence: u64) -> Result<Self> {
        let data =
            fs::read(path).map_err(|source| KeyDbError::SegmentRead { sequence, source })?;
        let entries = codec::decode_segment(&data)
            .map_err(|reason| KeyDbError::SegmentCorruption { sequence, reason })?;

        Ok(Self { sequence, entries })
    }

    /// Find the value stored for `key`
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_slice())
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries in stored order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
