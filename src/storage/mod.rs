//! In-memory storage engine.
//!
//! The store is two independent tables:
//! - a flat string table (key -> value)
//! - a hash table (hash name -> field -> value)
//!
//! Each table sits behind its own reader/writer lock, so string and hash
//! commands never contend with each other.

mod store;

pub use store::{HashSnapshot, Store, StringSnapshot};
