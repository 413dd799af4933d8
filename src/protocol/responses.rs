//! Pre-encoded RESP replies for the handful of responses sack sends most.

/// Static OK response: +OK\r\n
pub static OK: &[u8] = b"+OK\r\n";

/// Static PONG response: +PONG\r\n
pub static PONG: &[u8] = b"+PONG\r\n";

/// Static NULL bulk string: $-1\r\n
pub static NULL_BULK: &[u8] = b"$-1\r\n";

/// Static empty bulk string: $0\r\n\r\n
pub static EMPTY_BULK: &[u8] = b"$0\r\n\r\n";

/// Static empty array: *0\r\n
pub static EMPTY_ARRAY: &[u8] = b"*0\r\n";
