//! Configuration for keydb
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KeyDbError, Result};

/// Main configuration for a keydb instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── segments/        (segment files)
    pub data_dir: PathBuf,

    /// fsync each segment file (and its directory) before a flush completes
    pub sync_on_flush: bool,

    /// Decoded segments kept in memory for reads (least recently used evicted)
    pub segment_cache_capacity: usize,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Number of distinct keys in the memtable that triggers a flush
    pub flush_threshold: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Max accepted connections waiting for a worker
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./keydb_data"),
            sync_on_flush: true,
            segment_cache_capacity: 16,
            flush_threshold: 1024,
            listen_addr: "127.0.0.1:8080".to_string(),
            worker_threads: 4,
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine or server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            return Err(KeyDbError::Config(
                "flush_threshold must be at least 1".to_string(),
            ));
        }
        if self.segment_cache_capacity == 0 {
            return Err(KeyDbError::Config(
                "segment_cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(KeyDbError::Config(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(KeyDbError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set whether flushes fsync before completing
    pub fn sync_on_flush(mut self, sync: bool) -> Self {
        self.config.sync_on_flush = sync;
        self
    }

    /// Set how many decoded segments stay cached
    pub fn segment_cache_capacity(mut self, segments: usize) -> Self {
        self.config.segment_cache_capacity = segments;
        self
    }

    /// Set the memtable flush threshold (entry count)
    pub fn flush_threshold(mut self, entries: usize) -> Self {
        self.config.flush_threshold = entries;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of connection worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the maximum number of queued connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
