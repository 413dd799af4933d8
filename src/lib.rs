//! # sack
//!
//! A small in-memory key-value store that speaks RESP.
//!
//! sack keeps two tables in memory:
//! - strings: `SET`, `GET`, `DEL`
//! - hashes: `HSET`, `HGET`, `HGETALL`
//!
//! Write commands are appended to a log file before they run and the log
//! is replayed at startup, so data survives a restart. The log is synced
//! to disk once per second.
//!
//! ## Example
//!
//! ```no_run
//! use sack::{Config, Result, Server};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default();
//!     let server = Arc::new(Server::open(config)?);
//!     server.run().await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_lifetimes,
    unused_qualifications
)]
#![allow(clippy::module_name_repetitions)]

// ─────────────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────────────

/// Command parsing and execution layer.
pub mod commands;
/// Error types and result aliases.
pub mod error;
/// Append-only log persistence.
pub mod persistence;
/// RESP protocol implementation.
pub mod protocol;
/// TCP server and connection management.
pub mod server;
/// In-memory key-value storage engine.
pub mod storage;

// ─────────────────────────────────────────────────────────────────────────────
// Common Re-exports
// ─────────────────────────────────────────────────────────────────────────────

// Error handling
pub use error::{Error, Result};

// Protocol
pub use protocol::{Frame, RespParser};

// Server
pub use server::{Config, Server};

// Storage
pub use storage::Store;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Crate version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default server port.
pub const DEFAULT_PORT: u16 = 6379;

/// Default append log filename.
pub const DEFAULT_LOG_FILE: &str = "db.sack";

/// Default interval between append log syncs, in milliseconds.
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 1000;

/// Maximum bulk string size (512 MiB).
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of arguments in a command.
pub const MAX_ARGUMENTS: usize = 1_000_000;

/// Maximum array nesting depth accepted by the parser.
pub const MAX_NESTING_DEPTH: usize = 128;
