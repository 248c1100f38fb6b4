//! Storage Module
//!
//! Persistent storage layer: append-only, immutable segment files.
//!
//! ## Responsibilities
//! - Persist memtable snapshots as numbered segments
//! - Allocate sequence numbers numerically ("10" is newer than "9")
//! - Point lookups across segments, newest first
//! - Surface unreadable segments as typed errors
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/segments/
//!   ├── segment_000000.seg
//!   ├── segment_000001.seg
//!   └── segment_000002.tmp   (flush in progress, ignored by readers)
//! ```

pub mod segment;
mod manager;

pub use manager::{ScanOutcome, SegmentHit, SegmentStore};
pub use segment::{SegmentMeta, SegmentReader};
