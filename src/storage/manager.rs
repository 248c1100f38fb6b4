//! Segment Store
//!
//! Manages the directory of segments and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Allocate sequence numbers from the segments on disk
//! - Persist memtable snapshots as new segments
//! - Search segments newest → oldest for reads
//! - Report unreadable segments without aborting the search

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::entry::Entry;
use crate::error::{KeyDbError, Result};

use super::segment::{self, SegmentMeta, SegmentReader};

/// A value found in a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHit {
    pub sequence: u64,
    pub value: Vec<u8>,
}

/// Result of searching the segments for one key
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Value from the newest segment holding the key
    pub hit: Option<SegmentHit>,

    /// Segments newer than the hit (or all of them, on a miss) that could
    /// not be read, newest first
    pub failures: Vec<KeyDbError>,
}

/// Manages the segment directory
///
/// ## Concurrency:
/// - Segment files are immutable once committed, so scans take no lock
///   against writers; each scan works from the listing it took at its start.
/// - `cache`: most recently read segments, bounded LRU behind a Mutex.
///   Entries never go stale, they are only evicted.
/// - Writes are expected to be serialized by the caller (the engine holds
///   its memtable lock across allocate + write).
pub struct SegmentStore {
    /// Directory where segments are stored
    dir: PathBuf,

    /// fsync segment files and the directory on write
    sync: bool,

    /// Decoded segments by sequence (successful reads only)
    cache: Mutex<LruCache<u64, Arc<SegmentReader>>>,
}

impl SegmentStore {
    /// Decoded segments kept resident by `open`
    pub const DEFAULT_CACHE_CAPACITY: usize = 16;

    /// Open or create storage in the given directory
    ///
    /// Leftover temp files from interrupted flushes are removed; they were
    /// never committed, so no reader has seen them.
    pub fn open(dir: &Path, sync: bool) -> Result<Self> {
        Self::with_cache_capacity(dir, sync, Self::DEFAULT_CACHE_CAPACITY)
    }

    /// Open keeping at most `capacity` decoded segments in memory (min 1)
    pub fn with_cache_capacity(dir: &Path, sync: bool, capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        fs::create_dir_all(dir).map_err(|source| KeyDbError::DirectoryIo {
            path: dir.to_path_buf(),
            source,
        })?;

        let manager = Self {
            dir: dir.to_path_buf(),
            sync,
            cache: Mutex::new(LruCache::new(capacity)),
        };
        manager.remove_stale_temp_files()?;

        Ok(manager)
    }

    /// Sequence numbers of all committed segments, ascending
    pub fn list_sequences(&self) -> Result<Vec<u64>> {
        let mut sequences = Vec::new();

        for entry in fs::read_dir(&self.dir).map_err(|e| self.dir_error(e))? {
            let path = entry.map_err(|e| self.dir_error(e))?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(sequence) = segment::parse_sequence(&path) {
                sequences.push(sequence);
            }
        }

        sequences.sort_unstable();
        Ok(sequences)
    }

    /// Next sequence number: one past the largest on disk, or 0
    pub fn allocate_next_sequence(&self) -> Result<u64> {
        let sequences = self.list_sequences()?;
        Ok(sequences
            .last()
            .map(|&last| last.saturating_add(1))
            .unwrap_or(0))
    }

    /// Persist `entries` as segment `sequence`
    ///
    /// Any failure is a `FlushPersistence` error and leaves no new file.
    pub fn write_segment(&self, sequence: u64, entries: &[Entry]) -> Result<SegmentMeta> {
        let meta = segment::write_segment(&self.dir, sequence, entries, self.sync)
            .map_err(|source| KeyDbError::FlushPersistence { sequence, source })?;

        tracing::info!(
            "Wrote segment {} ({} entries, {} bytes)",
            meta.sequence,
            meta.entry_count,
            meta.file_size
        );

        Ok(meta)
    }

    /// Load a segment, from cache if it was read recently
    ///
    /// The file is decoded outside the cache lock; two readers racing on the
    /// same cold segment both decode it and the later insert wins.
    pub fn read_segment(&self, sequence: u64) -> Result<Arc<SegmentReader>> {
        if let Some(reader) = self.cache.lock().get(&sequence) {
            return Ok(Arc::clone(reader));
        }

        let reader = Arc::new(SegmentReader::open(&self.segment_path(sequence), sequence)?);
        self.cache.lock().put(sequence, Arc::clone(&reader));

        Ok(reader)
    }

    /// Number of decoded segments currently held in memory
    pub fn cached_segments(&self) -> usize {
        self.cache.lock().len()
    }

    /// Search segments newest → oldest for `key`
    ///
    /// Returns:
    /// - `Ok(outcome)` with `hit` set to the newest segment's value, if any
    /// - per-segment read/decode failures collected in `outcome.failures`
    /// - `Err(DirectoryIo)` only if the segment listing itself fails
    pub fn scan_for_key(&self, key: &[u8]) -> Result<ScanOutcome> {
        let sequences = self.list_sequences()?;
        let mut outcome = ScanOutcome::default();

        for &sequence in sequences.iter().rev() {
            match self.read_segment(sequence) {
                Ok(reader) => {
                    if let Some(value) = reader.get(key) {
                        outcome.hit = Some(SegmentHit {
                            sequence,
                            value: value.to_vec(),
                        });
                        return Ok(outcome);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping segment {}: {}", sequence, e);
                    outcome.failures.push(e);
                }
            }
        }

        Ok(outcome)
    }

    /// Get the number of committed segments
    pub fn segment_count(&self) -> Result<usize> {
        Ok(self.list_sequences()?.len())
    }

    /// Get the segment directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path of the segment with the given sequence
    pub fn segment_path(&self, sequence: u64) -> PathBuf {
        segment::segment_path(&self.dir, sequence)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn remove_stale_temp_files(&self) -> Result<()> {
        for entry in fs::read_dir(&self.dir).map_err(|e| self.dir_error(e))? {
            let path = entry.map_err(|e| self.dir_error(e))?.path();
            if !path.is_file() || !segment::is_temp_path(&path) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => tracing::warn!("Removed incomplete segment {}", path.display()),
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    fn dir_error(&self, source: std::io::Error) -> KeyDbError {
        KeyDbError::DirectoryIo {
            path: self.dir.clone(),
            source,
        }
    }
}
