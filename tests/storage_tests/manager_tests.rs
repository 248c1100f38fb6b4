//! Segment Store Tests
//!
//! Tests verify:
//! - Sequence allocation from the directory contents
//! - Numeric (not lexicographic) segment ordering
//! - Newest-first search with per-segment failure reporting
//! - Directory failures and stale temp file cleanup
//! - Decoded segment cache stays within its capacity

use std::fs;
use std::path::Path;

use keydb::error::KeyDbError;
use keydb::storage::SegmentStore;
use keydb::Entry;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_store(dir: &TempDir) -> SegmentStore {
    SegmentStore::open(&dir.path().join("segments"), false).unwrap()
}

fn entries(pairs: &[(&str, &str)]) -> Vec<Entry> {
    pairs
        .iter()
        .map(|(k, v)| Entry::new(k.as_bytes(), v.as_bytes()))
        .collect()
}

/// Allocate and write one segment, returning its sequence
fn flush(store: &SegmentStore, pairs: &[(&str, &str)]) -> u64 {
    let sequence = store.allocate_next_sequence().unwrap();
    store.write_segment(sequence, &entries(pairs)).unwrap();
    sequence
}

fn corrupt(path: &Path) {
    let mut data = fs::read(path).unwrap();
    let middle = data.len() / 2;
    data[middle] ^= 0xff;
    fs::write(path, data).unwrap();
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let dir = TempDir::new().unwrap();
    let segments = dir.path().join("a").join("b");

    let store = SegmentStore::open(&segments, true).unwrap();

    assert!(segments.is_dir());
    assert_eq!(store.dir(), segments.as_path());
    assert_eq!(store.segment_count().unwrap(), 0);
}

#[test]
fn test_open_fails_when_path_is_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("segments");
    fs::write(&path, b"not a directory").unwrap();

    let result = SegmentStore::open(&path, false);

    assert!(matches!(result, Err(KeyDbError::DirectoryIo { .. })));
}

#[test]
fn test_open_removes_stale_temp_files() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    flush(&store, &[("a", "1")]);
    let stale = store.dir().join("segment_000001.tmp");
    fs::write(&stale, b"half a segment").unwrap();
    drop(store);

    let store = open_store(&dir);

    assert!(!stale.exists());
    assert_eq!(store.list_sequences().unwrap(), vec![0]);
}

// =============================================================================
// Sequence Allocation Tests
// =============================================================================

#[test]
fn test_first_sequence_is_zero() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    assert_eq!(store.allocate_next_sequence().unwrap(), 0);
}

#[test]
fn test_allocation_follows_largest_sequence() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.write_segment(4, &entries(&[("a", "1")])).unwrap();
    store.write_segment(2, &entries(&[("b", "2")])).unwrap();

    assert_eq!(store.allocate_next_sequence().unwrap(), 5);
}

#[test]
fn test_allocation_without_write_does_not_advance() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    assert_eq!(store.allocate_next_sequence().unwrap(), 0);
    assert_eq!(store.allocate_next_sequence().unwrap(), 0);
}

#[test]
fn test_listing_ignores_foreign_entries() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    flush(&store, &[("a", "1")]);

    fs::write(store.dir().join("notes.txt"), b"hello").unwrap();
    fs::write(store.dir().join("segment_abc.seg"), b"junk").unwrap();
    fs::create_dir(store.dir().join("segment_000050.seg")).unwrap();

    assert_eq!(store.list_sequences().unwrap(), vec![0]);
    assert_eq!(store.allocate_next_sequence().unwrap(), 1);
}

#[test]
fn test_sequences_order_numerically_past_ten() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    for i in 0..12 {
        let key = format!("k{}", i);
        flush(&store, &[(key.as_str(), "v"), ("shared", key.as_str())]);
    }

    let sequences = store.list_sequences().unwrap();
    assert_eq!(sequences, (0..12).collect::<Vec<u64>>());
    assert_eq!(store.allocate_next_sequence().unwrap(), 12);

    // Newest (11) wins over 1, 10, 2...
    let outcome = store.scan_for_key(b"shared").unwrap();
    let hit = outcome.hit.unwrap();
    assert_eq!(hit.sequence, 11);
    assert_eq!(hit.value, b"k11".to_vec());
}

#[test]
fn test_allocation_after_directory_removed_is_directory_error() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    fs::remove_dir_all(store.dir()).unwrap();

    let err = store.allocate_next_sequence().unwrap_err();

    assert!(matches!(err, KeyDbError::DirectoryIo { .. }));
    assert!(err.is_retryable());
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_write_failure_is_flush_persistence() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    fs::create_dir(store.dir().join("segment_000000.tmp")).unwrap();

    let err = store.write_segment(0, &entries(&[("a", "1")])).unwrap_err();

    assert!(matches!(err, KeyDbError::FlushPersistence { sequence: 0, .. }));
    assert_eq!(store.segment_count().unwrap(), 0);
}

#[test]
fn test_write_existing_sequence_is_refused() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    flush(&store, &[("a", "1")]);

    let result = store.write_segment(0, &entries(&[("a", "2")]));

    assert!(matches!(result, Err(KeyDbError::FlushPersistence { .. })));
    let hit = store.scan_for_key(b"a").unwrap().hit.unwrap();
    assert_eq!(hit.value, b"1".to_vec());
}

// =============================================================================
// Scan Tests
// =============================================================================

#[test]
fn test_scan_empty_store_misses() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let outcome = store.scan_for_key(b"anything").unwrap();

    assert!(outcome.hit.is_none());
    assert!(outcome.failures.is_empty());
}

#[test]
fn test_scan_returns_newest_value() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    flush(&store, &[("a", "old"), ("b", "only")]);
    flush(&store, &[("a", "new")]);

    let a = store.scan_for_key(b"a").unwrap().hit.unwrap();
    let b = store.scan_for_key(b"b").unwrap().hit.unwrap();

    assert_eq!((a.sequence, a.value), (1, b"new".to_vec()));
    assert_eq!((b.sequence, b.value), (0, b"only".to_vec()));
}

#[test]
fn test_scan_skips_corrupt_segment_and_reports_it() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    flush(&store, &[("a", "from-0")]);
    flush(&store, &[("a", "from-1")]);
    corrupt(&store.segment_path(1));

    let outcome = store.scan_for_key(b"a").unwrap();

    assert_eq!(outcome.hit.unwrap().value, b"from-0".to_vec());
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        outcome.failures[0],
        KeyDbError::SegmentCorruption { sequence: 1, .. }
    ));
}

#[test]
fn test_scan_reports_every_unreadable_segment_on_miss() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    for _ in 0..3 {
        flush(&store, &[("x", "y")]);
    }
    corrupt(&store.segment_path(0));
    corrupt(&store.segment_path(2));

    let outcome = store.scan_for_key(b"missing").unwrap();

    assert!(outcome.hit.is_none());
    let failed: Vec<Option<u64>> = outcome.failures.iter().map(|e| e.segment()).collect();
    assert_eq!(failed, vec![Some(2), Some(0)]);
}

#[test]
fn test_scan_stops_at_first_hit() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    flush(&store, &[("a", "1")]);
    flush(&store, &[("a", "2")]);
    // Older segment is broken but never consulted
    corrupt(&store.segment_path(0));

    let outcome = store.scan_for_key(b"a").unwrap();

    assert_eq!(outcome.hit.unwrap().value, b"2".to_vec());
    assert!(outcome.failures.is_empty());
}

// =============================================================================
// Cache Tests
// =============================================================================

#[test]
fn test_recent_segment_reads_are_cached() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    flush(&store, &[("a", "1")]);

    let first = store.read_segment(0).unwrap();
    let second = store.read_segment(0).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.get(b"a"), Some(&b"1"[..]));
    assert_eq!(store.cached_segments(), 1);
}

#[test]
fn test_full_miss_scan_keeps_cache_bounded() {
    let dir = TempDir::new().unwrap();
    let store = SegmentStore::with_cache_capacity(&dir.path().join("segments"), false, 4).unwrap();
    let value = "v".repeat(1024);
    for i in 0..40 {
        let key = format!("key{}", i);
        flush(&store, &[(key.as_str(), value.as_str())]);
    }

    let outcome = store.scan_for_key(b"missing").unwrap();

    assert!(outcome.hit.is_none());
    assert!(outcome.failures.is_empty());
    assert_eq!(store.cached_segments(), 4);
}

#[test]
fn test_evicted_segment_is_reloaded_from_disk() {
    let dir = TempDir::new().unwrap();
    let store = SegmentStore::with_cache_capacity(&dir.path().join("segments"), false, 2).unwrap();
    for i in 0..3 {
        let value = i.to_string();
        flush(&store, &[("shared", value.as_str())]);
    }

    let oldest = store.read_segment(0).unwrap();
    store.read_segment(1).unwrap();
    store.read_segment(2).unwrap();
    let reloaded = store.read_segment(0).unwrap();

    assert!(!std::sync::Arc::ptr_eq(&oldest, &reloaded));
    assert_eq!(reloaded.get(b"shared"), Some(&b"0"[..]));
    assert_eq!(store.cached_segments(), 2);
}

#[test]
fn test_zero_cache_capacity_still_caches_one() {
    let dir = TempDir::new().unwrap();
    let store = SegmentStore::with_cache_capacity(&dir.path().join("segments"), false, 0).unwrap();
    flush(&store, &[("a", "1")]);
    flush(&store, &[("b", "2")]);

    assert!(store.scan_for_key(b"zzz").unwrap().hit.is_none());
    assert_eq!(store.cached_segments(), 1);
}
