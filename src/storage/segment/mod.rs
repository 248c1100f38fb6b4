//! Segment Module
//!
//! Immutable on-disk file holding one flushed memtable snapshot.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "KVSG" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Entries (variable)                                      │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                │
//! │   ... repeated Count times, in no particular order ...  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                        │
//! │   CRC32 of header + entries                             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! All integers are little-endian.
//!
//! ## Naming
//! A segment with sequence `n` lives in `segment_{n:06}.seg`. While being
//! written it is `segment_{n:06}.tmp`; the rename is the commit point.

mod codec;
mod reader;
mod writer;

use std::path::{Path, PathBuf};

pub use codec::{decode_segment, encode_segment};
pub use reader::SegmentReader;
pub use writer::write_segment;

// =============================================================================
// Shared Constants (used by codec, reader, writer)
// =============================================================================

/// Magic bytes identifying a keydb segment file
pub(crate) const MAGIC: &[u8; 4] = b"KVSG";

/// Current segment format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) = 14 bytes
pub(crate) const HEADER_SIZE: usize = 14;

/// Per-entry header: KeyLen (4) + ValLen (4) = 8 bytes
pub(crate) const ENTRY_HEADER_SIZE: usize = 8;

/// Footer size: CRC32 (4) = 4 bytes
pub(crate) const FOOTER_SIZE: usize = 4;

/// Longest key or value a `u32` length prefix can describe
pub const MAX_FIELD_LEN: u64 = u32::MAX as u64;

const FILE_PREFIX: &str = "segment_";
const SEGMENT_EXTENSION: &str = "seg";
const TEMP_EXTENSION: &str = "tmp";

// =============================================================================
// Segment Metadata
// =============================================================================

/// Metadata for a segment that has been written
#[derive(Debug, Clone)]
pub struct SegmentMeta {
    /// Sequence number (newer segments have larger numbers)
    pub sequence: u64,
    /// Path to the segment file
    pub path: PathBuf,
    /// Number of entries in this segment
    pub entry_count: u64,
    /// File size in bytes
    pub file_size: u64,
}

// =============================================================================
// File Naming
// =============================================================================

/// Path of the committed segment with the given sequence
pub fn segment_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("{FILE_PREFIX}{sequence:06}.{SEGMENT_EXTENSION}"))
}

/// Path a segment is written to before it is committed
pub fn temp_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("{FILE_PREFIX}{sequence:06}.{TEMP_EXTENSION}"))
}

/// Parse a sequence from a committed segment path.
/// "segment_000042.seg" → Some(42); temp files and strangers → None
pub fn parse_sequence(path: &Path) -> Option<u64> {
    parse_with_extension(path, SEGMENT_EXTENSION)
}

/// Whether the path names an uncommitted segment
pub fn is_temp_path(path: &Path) -> bool {
    parse_with_extension(path, TEMP_EXTENSION).is_some()
}

fn parse_with_extension(path: &Path, extension: &str) -> Option<u64> {
    if path.extension()?.to_str()? != extension {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(FILE_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
