//! Error types for sack.
//!
//! Errors are split by layer: the wire codec, command dispatch, and the
//! append-only log. `Error` wraps all of them for callers that only need
//! to propagate.

use std::io;
use std::net::AddrParseError;
use std::num::ParseIntError;
use thiserror::Error;

/// Result type alias for sack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sack.
#[derive(Error, Debug)]
pub enum Error {
    /// Protocol parsing errors
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Command execution errors
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Append-only log errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Address parsing error
    #[error("address parse error: {0}")]
    AddrParse(#[from] AddrParseError),
}

/// Protocol-level errors during RESP decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Unknown RESP type tag
    #[error("invalid type marker: {0:?}")]
    InvalidTypeMarker(u8),

    /// Invalid UTF-8 in a simple string or error line
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,

    /// Length or integer field is not a number
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Negative bulk length other than the null marker
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Negative array length
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Stream ended in the middle of a frame
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Bulk string too large
    #[error("bulk string too large: {len} bytes (max: {max})")]
    BulkTooLarge {
        /// Declared bulk string length in bytes
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Too many array elements
    #[error("too many array elements: {count} (max: {max})")]
    TooManyElements {
        /// Declared element count
        count: usize,
        /// Maximum allowed count
        max: usize,
    },

    /// Arrays nested deeper than the parser allows
    #[error("nesting too deep (max: {max})")]
    NestingTooDeep {
        /// Maximum allowed depth
        max: usize,
    },

    /// Missing CRLF terminator after a bulk body
    #[error("missing CRLF terminator")]
    MissingCrlf,

    /// Incomplete frame - need more data
    #[error("incomplete frame, need more data")]
    Incomplete,
}

/// Command execution errors.
///
/// The `Display` text is what clients see in the `-ERR ...` reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    /// Wrong number of arguments
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongArity {
        /// Command name that received wrong arity
        command: String,
    },

    /// Request is not a non-empty array of strings
    #[error("ERR invalid request: {0}")]
    InvalidRequest(&'static str),
}

/// Append-only log errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The log cannot be decoded from this offset on
    #[error("corrupted append log at byte {offset}: {source}")]
    Corrupted {
        /// Byte offset of the first undecodable entry
        offset: usize,
        /// Underlying decode failure
        source: ProtocolError,
    },

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Converts the error to a RESP error reply string.
    #[must_use]
    pub fn to_reply(&self) -> String {
        match self {
            Error::Protocol(e) => format!("ERR Protocol error: {e}"),
            Error::Command(e) => e.to_string(),
            Error::Storage(e) => format!("ERR {e}"),
            Error::Io(e) => format!("ERR I/O error: {e}"),
            Error::Config(e) => format!("ERR configuration error: {e}"),
            Error::AddrParse(e) => format!("ERR address parse error: {e}"),
        }
    }
}

impl From<ParseIntError> for ProtocolError {
    fn from(e: ParseIntError) -> Self {
        ProtocolError::InvalidInteger(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Command(CommandError::WrongArity {
            command: "set".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "command error: ERR wrong number of arguments for 'set' command"
        );
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::InvalidTypeMarker(b'X');
        assert_eq!(err.to_string(), "invalid type marker: 88");
    }

    #[test]
    fn test_corrupted_display_carries_offset() {
        let err = StorageError::Corrupted {
            offset: 42,
            source: ProtocolError::UnexpectedEof,
        };
        assert_eq!(
            err.to_string(),
            "corrupted append log at byte 42: unexpected end of input"
        );
    }

    #[test]
    fn test_to_reply() {
        let err = Error::Protocol(ProtocolError::MissingCrlf);
        assert_eq!(err.to_reply(), "ERR Protocol error: missing CRLF terminator");

        let err = Error::Command(CommandError::WrongArity {
            command: "get".to_string(),
        });
        assert_eq!(
            err.to_reply(),
            "ERR wrong number of arguments for 'get' command"
        );
    }
}
