//! Redis Serialization Protocol (RESP) implementation.
//!
//! Only the RESP2 subset sack speaks: simple strings, errors, integers,
//! bulk strings (including the null bulk string) and arrays. The same
//! encoding is used on the wire and in the append-only log.

mod frame;
mod parser;
mod responses;

pub use frame::Frame;
pub use parser::{RespParser, parse_frame};

/// Type markers for RESP.
pub mod markers {
    /// Simple string: +
    pub const SIMPLE_STRING: u8 = b'+';
    /// Error: -
    pub const ERROR: u8 = b'-';
    /// Integer: :
    pub const INTEGER: u8 = b':';
    /// Bulk string: $
    pub const BULK_STRING: u8 = b'$';
    /// Array: *
    pub const ARRAY: u8 = b'*';
}
