//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use super::Connection;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KeyDbError, Result};

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for keydb
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            KeyDbError::Network(format!("Failed to bind {}: {}", config.listen_addr, e))
        })?;
        // Non-blocking accept so the loop can observe shutdown.
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops the server when set to true
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal the server to shut down gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Run the accept loop until shutdown (blocking)
    ///
    /// Accepted streams go through a bounded queue to a fixed worker pool;
    /// when every worker is busy and the queue is full, accepting pauses.
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Listening on {} with {} workers",
            self.local_addr()?,
            self.config.worker_threads
        );

        let (sender, receiver) = channel::bounded::<TcpStream>(self.config.max_connections);

        let mut workers = Vec::with_capacity(self.config.worker_threads);
        for id in 0..self.config.worker_threads {
            let receiver = receiver.clone();
            let engine = Arc::clone(&self.engine);
            let config = self.config.clone();
            let handle = thread::Builder::new()
                .name(format!("keydb-worker-{}", id))
                .spawn(move || worker_loop(receiver, engine, &config))?;
            workers.push(handle);
        }
        drop(receiver);

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::trace!("Accepted connection from {}", addr);
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                        continue;
                    }
                    if sender.send(stream).is_err() {
                        tracing::error!("All workers exited, stopping accept loop");
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        // Closing the queue lets workers finish their current connection and exit.
        drop(sender);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

fn worker_loop(receiver: Receiver<TcpStream>, engine: Arc<Engine>, config: &Config) {
    for stream in receiver.iter() {
        let mut connection = match Connection::new(stream, Arc::clone(&engine)) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!("Failed to set up connection: {}", e);
                continue;
            }
        };

        if let Err(e) = connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms) {
            tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
            continue;
        }

        if let Err(e) = connection.handle() {
            tracing::debug!("Connection {} closed with error: {}", connection.peer_addr(), e);
        }
    }
}
