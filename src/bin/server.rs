//! keydb Server Binary
//!
//! Starts the TCP server for keydb.

use std::sync::Arc;

use clap::Parser;
use keydb::network::Server;
use keydb::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// keydb Server
#[derive(Parser, Debug)]
#[command(name = "keydb-server")]
#[command(about = "Minimal key-value store with a red-black memtable and segment files")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./keydb_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Number of keys in the memtable that triggers a flush
    #[arg(short, long, default_value = "1024")]
    flush_threshold: usize,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Skip fsync on flush (faster, not crash safe)
    #[arg(long)]
    no_sync: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,keydb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("keydb server v{}", keydb::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .flush_threshold(args.flush_threshold)
        .worker_threads(args.workers)
        .sync_on_flush(!args.no_sync)
        .build();

    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, Arc::clone(&engine)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    // Workers have exited, so this is the last reference.
    match Arc::try_unwrap(engine) {
        Ok(engine) => {
            if let Err(e) = engine.close() {
                tracing::error!("Failed to flush on shutdown: {}", e);
                std::process::exit(1);
            }
        }
        Err(_) => tracing::warn!("Engine still shared at shutdown, skipping final flush"),
    }
}
