//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polls for shutdown)
//! - Worker thread pool fed by a bounded crossbeam channel
//! - Commands routed to the Engine's put/get

mod connection;
mod server;

pub use connection::{execute_command, Connection};
pub use server::Server;
