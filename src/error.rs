//! Error types for keydb
//!
//! Provides a unified error type for all operations.
//!
//! The in-memory index never fails; every variant here originates in the
//! segment store, the collaborator layers, or caller input.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using KeyDbError
pub type Result<T> = std::result::Result<T, KeyDbError>;

/// Unified error type for keydb operations
#[derive(Debug, Error)]
pub enum KeyDbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Invalid request: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    /// Creating, writing or finalizing a segment failed. The memtable is
    /// left intact, so the write can be retried.
    #[error("Failed to persist segment {sequence}: {source}")]
    FlushPersistence {
        sequence: u64,
        #[source]
        source: std::io::Error,
    },

    /// A segment's bytes could not be decoded.
    #[error("Segment {sequence} is corrupt: {reason}")]
    SegmentCorruption {
        sequence: u64,
        #[source]
        reason: Corruption,
    },

    /// A segment exists but could not be read.
    #[error("Failed to read segment {sequence}: {source}")]
    SegmentRead {
        sequence: u64,
        #[source]
        source: std::io::Error,
    },

    /// The segment directory could not be created or enumerated.
    #[error("Cannot access segment directory {}: {source}", path.display())]
    DirectoryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KeyDbError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Storage I/O faults are transient from the engine's point of view;
    /// corruption and bad input are not. A flush that failed on input the
    /// segment format cannot encode fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            KeyDbError::FlushPersistence { source, .. } => {
                source.kind() != std::io::ErrorKind::InvalidInput
            }
            KeyDbError::Io(_) | KeyDbError::SegmentRead { .. } | KeyDbError::DirectoryIo { .. } => {
                true
            }
            _ => false,
        }
    }

    /// Sequence number of the segment this error refers to, if any.
    pub fn segment(&self) -> Option<u64> {
        match self {
            KeyDbError::FlushPersistence { sequence, .. }
            | KeyDbError::SegmentCorruption { sequence, .. }
            | KeyDbError::SegmentRead { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }
}

/// Reasons a segment fails to decode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Corruption {
    #[error("invalid magic bytes {0:?}")]
    BadMagic([u8; 4]),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    #[error("truncated {context}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        context: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("{0} unexpected bytes after last entry")]
    TrailingBytes(usize),
}
