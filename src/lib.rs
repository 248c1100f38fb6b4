//! # keydb
//!
//! A minimal key-value storage engine:
//! - Red-black tree memtable absorbs writes
//! - Memtable flushed to immutable, numbered on-disk segments
//! - Reads check the memtable, then segments newest → oldest
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │                  (Worker Thread Pool)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ put / get
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                │
//! │        (memtable lock held across check-and-swap)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │ flush                   │ miss
//!          ▼                         ▼
//!   ┌─────────────┐          ┌───────────────┐
//!   │  MemTable   │ ───────▶ │ Segment Store │
//!   │ (RB tree)   │          │ (newest first)│
//!   └─────────────┘          └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod entry;
pub mod error;

pub mod engine;
pub mod memtable;
pub mod network;
pub mod protocol;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::{Engine, Lookup, Source};
pub use entry::Entry;
pub use error::{KeyDbError, Result};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of keydb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
