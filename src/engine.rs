//! Engine Module
//!
//! The core storage engine that coordinates the memtable and segments.
//!
//! ## Responsibilities
//! - Apply writes to the memtable
//! - Flush the memtable to a new segment when it reaches the threshold
//! - Serve reads from the memtable first, then segments newest → oldest
//!
//! ## Memtable lifecycle
//! ```text
//! Empty ──put──▶ Growing ──len ≥ threshold──▶ Flushing ──ok──▶ Empty
//!                   ▲                             │
//!                   └────────── write failed ─────┘
//! ```

use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{KeyDbError, Result};
use crate::memtable::MemTable;
use crate::storage::segment::MAX_FIELD_LEN;
use crate::storage::{SegmentMeta, SegmentStore};

/// Where a lookup found its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    MemTable,
    Segment(u64),
}

/// Full result of a lookup
#[derive(Debug)]
pub struct Lookup {
    /// The freshest value for the key, if any was found
    pub value: Option<Vec<u8>>,

    /// Tier the value came from
    pub source: Option<Source>,

    /// Segments consulted before the answer that could not be read, newest
    /// first. Any entry here means the answer may be stale or incomplete.
    pub skipped: Vec<KeyDbError>,
}

impl Lookup {
    pub fn found(&self) -> bool {
        self.value.is_some()
    }

    /// Whether every tier that had to be consulted was readable
    pub fn is_conclusive(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// The main storage engine
///
/// ## Concurrency Model
///
/// - One `Mutex` guards the memtable. Insert, the threshold check, the
///   segment write and the swap to an empty memtable all happen under it,
///   so concurrent writers can never flush the same data twice and readers
///   never see a half-swapped memtable.
/// - Memtable reads take the same lock briefly and release it before any
///   segment I/O.
/// - Segment scans run without the lock. A flush completing during a scan
///   may or may not be visible to it.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Live memtable (newest, unflushed writes)
    memtable: Mutex<MemTable>,

    /// Immutable on-disk segments
    segments: SegmentStore,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const SEGMENT_DIR: &'static str = "segments";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Create data and segment directories
    /// 3. Start with an empty memtable
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.data_dir).map_err(|source| KeyDbError::DirectoryIo {
            path: config.data_dir.clone(),
            source,
        })?;

        let segment_dir = config.data_dir.join(Self::SEGMENT_DIR);
        let segments = SegmentStore::with_cache_capacity(
            &segment_dir,
            config.sync_on_flush,
            config.segment_cache_capacity,
        )?;

        tracing::info!(
            "Opened engine at {} ({} segments, flush threshold {})",
            config.data_dir.display(),
            segments.segment_count()?,
            config.flush_threshold
        );

        Ok(Self {
            config,
            memtable: Mutex::new(MemTable::new()),
            segments,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. Segments (newest to oldest)
    ///
    /// If a segment that had to be consulted could not be read, the first
    /// such error is returned instead of an answer that might be stale.
    /// Use [`Engine::lookup`] to get the answer together with the skipped
    /// segments.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let lookup = self.lookup(key)?;
        match lookup.skipped.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(lookup.value),
        }
    }

    /// Get a value by key, reporting its source and any unreadable segments
    pub fn lookup(&self, key: &[u8]) -> Result<Lookup> {
        Self::validate_key(key)?;

        // Step 1: Check MemTable first (shadows every segment)
        if let Some(value) = self.memtable.lock().get(key) {
            return Ok(Lookup {
                value: Some(value.to_vec()),
                source: Some(Source::MemTable),
                skipped: Vec::new(),
            });
        }

        // Step 2: Check segments (newest to oldest), without the memtable lock
        let outcome = self.segments.scan_for_key(key)?;
        let (value, source) = match outcome.hit {
            Some(hit) => (Some(hit.value), Some(Source::Segment(hit.sequence))),
            None => (None, None),
        };

        tracing::trace!(
            "Lookup {:?}: source={:?}, skipped={}",
            String::from_utf8_lossy(key),
            source,
            outcome.failures.len()
        );

        Ok(Lookup {
            value,
            source,
            skipped: outcome.failures,
        })
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Acquire memtable lock
    /// 2. Insert into MemTable
    /// 3. Flush if the entry count reached the threshold
    ///
    /// A flush failure is returned to the caller with the memtable (and so
    /// this write) still in place; the next put or [`Engine::flush`] retries.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Self::validate_key(key)?;
        Self::validate_lengths(key.len(), value.len())?;

        let mut memtable = self.memtable.lock();
        memtable.put(key.to_vec(), value.to_vec());

        if memtable.should_flush(self.config.flush_threshold) {
            Self::flush_locked(&self.segments, &mut memtable)?;
        }

        Ok(())
    }

    /// Flush memtable to disk (public API)
    ///
    /// Forces a flush regardless of memtable size. Returns the new segment's
    /// metadata, or `None` if the memtable was empty.
    pub fn flush(&self) -> Result<Option<SegmentMeta>> {
        let mut memtable = self.memtable.lock();
        if memtable.is_empty() {
            return Ok(None);
        }
        Self::flush_locked(&self.segments, &mut memtable).map(Some)
    }

    /// Internal flush implementation (called with memtable lock held)
    fn flush_locked(segments: &SegmentStore, memtable: &mut MemTable) -> Result<SegmentMeta> {
        let sequence = segments.allocate_next_sequence()?;
        let entries = memtable.entries();

        tracing::debug!("Flushing {} entries to segment {}", entries.len(), sequence);

        let meta = match segments.write_segment(sequence, &entries) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!("Flush to segment {} failed, memtable retained: {}", sequence, e);
                return Err(e);
            }
        };

        // Only a committed segment may replace the memtable.
        *memtable = MemTable::new();

        Ok(meta)
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data; there is no write-ahead log, so unflushed
    /// writes are otherwise lost when the process exits.
    pub fn close(self) -> Result<()> {
        if let Some(meta) = self.flush()? {
            tracing::info!("Flushed {} entries on close", meta.entry_count);
        }
        Ok(())
    }

    fn validate_key(key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(KeyDbError::Validation("key must not be empty".to_string()));
        }
        Ok(())
    }

    /// Reject keys and values too long for a segment length prefix
    fn validate_lengths(key_len: usize, value_len: usize) -> Result<()> {
        for (what, len) in [("key", key_len), ("value", value_len)] {
            if len as u64 > MAX_FIELD_LEN {
                return Err(KeyDbError::Validation(format!(
                    "{} of {} bytes exceeds the {} byte limit",
                    what, len, MAX_FIELD_LEN
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the segment directory path
    pub fn segment_dir(&self) -> &Path {
        self.segments.dir()
    }

    /// Get the memtable entry count
    pub fn memtable_len(&self) -> usize {
        self.memtable.lock().entry_count()
    }

    /// Get the approximate memtable size in bytes
    pub fn memtable_size(&self) -> usize {
        self.memtable.lock().size()
    }

    /// Get the number of segments on disk
    pub fn segment_count(&self) -> Result<usize> {
        self.segments.segment_count()
    }

    /// Access the segment store
    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
