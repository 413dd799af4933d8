//! RESP frame types.
//!
//! A Frame is one complete RESP value: a request, a reply, or an entry of
//! the append-only log.

use super::responses;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// A RESP frame representing a complete protocol message.
///
/// # Design
///
/// Frames are cheap to clone (using `Bytes` for data) and serialize by
/// writing straight into a `BytesMut`.
#[derive(Clone, PartialEq, Eq)]
pub enum Frame {
    /// Simple string (no CR or LF allowed)
    Simple(String),

    /// Error message
    Error(String),

    /// 64-bit signed integer
    Integer(i64),

    /// Bulk string (binary-safe)
    Bulk(Bytes),

    /// Null bulk string
    Null,

    /// Array of frames
    Array(Vec<Frame>),
}

impl Frame {
    /// Create a simple string frame.
    #[inline]
    pub fn simple(s: impl Into<String>) -> Self {
        Self::Simple(s.into())
    }

    /// Create an error frame.
    #[inline]
    pub fn error(s: impl Into<String>) -> Self {
        Self::Error(s.into())
    }

    /// Create an integer frame.
    #[inline]
    pub fn integer(n: i64) -> Self {
        Self::Integer(n)
    }

    /// Create a bulk string frame.
    #[inline]
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Self::Bulk(data.into())
    }

    /// Create an array frame.
    #[inline]
    pub fn array(frames: Vec<Frame>) -> Self {
        Self::Array(frames)
    }

    /// Create an empty array frame.
    #[inline]
    pub fn empty_array() -> Self {
        Self::Array(Vec::new())
    }

    /// Create an OK response.
    #[inline]
    pub fn ok() -> Self {
        Self::Simple("OK".to_string())
    }

    /// Create a PONG response.
    #[inline]
    pub fn pong() -> Self {
        Self::Simple("PONG".to_string())
    }

    /// Build a request array of bulk strings, e.g. `["SET", "k", "v"]`.
    pub fn command<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Self::Array(
            parts
                .into_iter()
                .map(|p| Self::Bulk(Bytes::copy_from_slice(p.as_ref())))
                .collect(),
        )
    }

    /// Check if this is an error frame.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Serialize the frame to a buffer.
    ///
    /// Common replies (OK, PONG, null, empty bulk, empty array) are copied
    /// from pre-encoded statics.
    pub fn serialize(&self, buf: &mut BytesMut) {
        match self {
            Self::Simple(s) => match s.as_str() {
                "OK" => buf.put_slice(responses::OK),
                "PONG" => buf.put_slice(responses::PONG),
                _ => {
                    buf.put_u8(b'+');
                    buf.put_slice(s.as_bytes());
                    buf.put_slice(b"\r\n");
                }
            },
            Self::Error(s) => {
                buf.put_u8(b'-');
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            Self::Integer(n) => {
                buf.put_u8(b':');
                let mut temp = itoa::Buffer::new();
                buf.put_slice(temp.format(*n).as_bytes());
                buf.put_slice(b"\r\n");
            }
            Self::Bulk(data) => {
                if data.is_empty() {
                    buf.put_slice(responses::EMPTY_BULK);
                } else {
                    buf.put_u8(b'$');
                    let mut temp = itoa::Buffer::new();
                    buf.put_slice(temp.format(data.len()).as_bytes());
                    buf.put_slice(b"\r\n");
                    buf.put_slice(data);
                    buf.put_slice(b"\r\n");
                }
            }
            Self::Null => {
                buf.put_slice(responses::NULL_BULK);
            }
            Self::Array(frames) => {
                if frames.is_empty() {
                    buf.put_slice(responses::EMPTY_ARRAY);
                } else {
                    buf.put_u8(b'*');
                    let mut temp = itoa::Buffer::new();
                    buf.put_slice(temp.format(frames.len()).as_bytes());
                    buf.put_slice(b"\r\n");
                    for frame in frames {
                        frame.serialize(buf);
                    }
                }
            }
        }
    }

    /// Calculate the serialized size of this frame.
    pub fn serialized_size(&self) -> usize {
        match self {
            Self::Simple(s) | Self::Error(s) => 1 + s.len() + 2,
            Self::Integer(n) => {
                let sign = usize::from(*n < 0);
                1 + sign + decimal_len(n.unsigned_abs()) + 2
            }
            Self::Bulk(data) => {
                1 + decimal_len(data.len() as u64) + 2 + data.len() + 2 // $<len>\r\n<data>\r\n
            }
            Self::Null => responses::NULL_BULK.len(),
            Self::Array(frames) => {
                let content_size: usize = frames.iter().map(Frame::serialized_size).sum();
                1 + decimal_len(frames.len() as u64) + 2 + content_size // *<len>\r\n<frames>
            }
        }
    }

    /// Convert to a `Vec<u8>` for convenience.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.serialized_size());
        self.serialize(&mut buf);
        buf.to_vec()
    }
}

/// Number of ASCII digits needed to print `n`.
fn decimal_len(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(s) => write!(f, "Simple({s:?})"),
            Self::Error(s) => write!(f, "Error({s:?})"),
            Self::Integer(n) => write!(f, "Integer({n})"),
            Self::Bulk(b) => {
                if let Ok(s) = std::str::from_utf8(b) {
                    write!(f, "Bulk({s:?})")
                } else {
                    write!(f, "Bulk({b:?})")
                }
            }
            Self::Null => write!(f, "Null"),
            Self::Array(arr) => {
                write!(f, "Array[")?;
                for (i, frame) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{frame:?}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Human-readable rendering, in the style of `redis-cli`.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(s) => write!(f, "{s}"),
            Self::Error(s) => write!(f, "(error) {s}"),
            Self::Integer(n) => write!(f, "(integer) {n}"),
            Self::Bulk(b) => {
                if let Ok(s) = std::str::from_utf8(b) {
                    write!(f, "\"{s}\"")
                } else {
                    write!(f, "<{} bytes>", b.len())
                }
            }
            Self::Null => write!(f, "(nil)"),
            Self::Array(arr) if arr.is_empty() => write!(f, "(empty array)"),
            Self::Array(arr) => {
                for (i, frame) in arr.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {frame}", i + 1)?;
                }
                Ok(())
            }
        }
    }
}
