//! RESP protocol parser.
//!
//! The parser buffers raw bytes and decodes frames with two primitives,
//! "read a line up to CRLF" and "read exactly N bytes". Scalars are only
//! consumed once they are complete. Array headers and finished elements are
//! consumed as they arrive and kept on a stack of open arrays, so an array
//! split across socket reads resumes where it stopped instead of being
//! decoded again from its first element.

use super::frame::Frame;
use super::markers;
use crate::error::ProtocolError;
use crate::{MAX_ARGUMENTS, MAX_BULK_SIZE, MAX_NESTING_DEPTH};
use bytes::{Buf, Bytes, BytesMut};
use memchr::memchr;

/// RESP protocol parser with streaming support.
///
/// # Usage
///
/// ```ignore
/// let mut parser = RespParser::new();
/// parser.extend(data);
///
/// while let Some(frame) = parser.parse()? {
///     // Handle frame
/// }
/// ```
///
/// # Security
///
/// - Maximum bulk string size: 512MB
/// - Maximum array elements: 1M
/// - Maximum array nesting: 128
#[derive(Debug, Default)]
pub struct RespParser {
    buffer: BytesMut,
    /// Arrays whose header has been read but not all of their elements.
    open: Vec<OpenArray>,
}

#[derive(Debug)]
struct OpenArray {
    len: usize,
    items: Vec<Frame>,
}

/// One decoding step: a finished frame or the header of a non-empty array.
enum Step {
    Frame(Frame),
    ArrayHeader(usize),
}

impl RespParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Create a parser with specified buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            open: Vec::new(),
        }
    }

    /// Add data to the parser buffer.
    #[inline]
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Returns true if no input is held, buffered or partly decoded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.open.is_empty()
    }

    /// Returns the number of buffered bytes not yet decoded.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Try to parse a complete frame from the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was parsed
    /// - `Ok(None)` if more data is needed
    /// - `Err(e)` if the data is malformed
    pub fn parse(&mut self) -> Result<Option<Frame>, ProtocolError> {
        loop {
            let mut cursor = Cursor::new(&self.buffer);
            let step = match decode_step(&mut cursor, self.open.len()) {
                Ok(step) => step,
                Err(ProtocolError::Incomplete) => return Ok(None),
                Err(e) => return Err(e),
            };
            let consumed = cursor.pos;
            self.buffer.advance(consumed);

            match step {
                Step::ArrayHeader(len) => self.open.push(OpenArray {
                    len,
                    items: Vec::with_capacity(len.min(1024)),
                }),
                Step::Frame(frame) => {
                    if let Some(frame) = self.complete(frame) {
                        return Ok(Some(frame));
                    }
                }
            }
        }
    }

    /// Attach `frame` to the innermost open array, closing every array it
    /// fills. Returns the top-level frame once nothing is left open.
    fn complete(&mut self, mut frame: Frame) -> Option<Frame> {
        while let Some(mut array) = self.open.pop() {
            array.items.push(frame);
            if array.items.len() < array.len {
                self.open.push(array);
                return None;
            }
            frame = Frame::Array(array.items);
        }
        Some(frame)
    }

    /// Report how the input stream ended.
    ///
    /// Call once the underlying source returns EOF and `parse` has returned
    /// `Ok(None)`. An empty parser is a clean end of stream; leftover bytes
    /// or an unfinished array are a truncated frame.
    pub fn finish(&self) -> Result<(), ProtocolError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedEof)
        }
    }
}

/// Read position over a borrowed byte slice.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        let b = *self.remaining().first().ok_or(ProtocolError::Incomplete)?;
        self.pos += 1;
        Ok(b)
    }

    /// Read up to the next CRLF, consuming the terminator.
    fn read_line(&mut self) -> Result<&'a [u8], ProtocolError> {
        let rest = self.remaining();
        let end = find_crlf(rest).ok_or(ProtocolError::Incomplete)?;
        self.pos += end + 2;
        Ok(&rest[..end])
    }

    /// Read exactly `n` bytes.
    fn read_exact(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let rest = self.remaining();
        if rest.len() < n {
            return Err(ProtocolError::Incomplete);
        }
        self.pos += n;
        Ok(&rest[..n])
    }

    fn read_text(&mut self) -> Result<String, ProtocolError> {
        let line = self.read_line()?;
        let s = std::str::from_utf8(line).map_err(|_| ProtocolError::InvalidUtf8)?;
        Ok(s.to_string())
    }

    fn read_integer(&mut self) -> Result<i64, ProtocolError> {
        let line = self.read_line()?;
        let s = std::str::from_utf8(line)
            .map_err(|_| ProtocolError::InvalidInteger(String::from_utf8_lossy(line).into_owned()))?;
        Ok(s.parse()?)
    }
}

/// Decode the next scalar or array header. `depth` is the number of arrays
/// currently open around it.
fn decode_step(cursor: &mut Cursor<'_>, depth: usize) -> Result<Step, ProtocolError> {
    match cursor.read_u8()? {
        markers::SIMPLE_STRING => Ok(Step::Frame(Frame::Simple(cursor.read_text()?))),
        markers::ERROR => Ok(Step::Frame(Frame::Error(cursor.read_text()?))),
        markers::INTEGER => Ok(Step::Frame(Frame::Integer(cursor.read_integer()?))),
        markers::BULK_STRING => decode_bulk(cursor).map(Step::Frame),
        markers::ARRAY => decode_array_header(cursor, depth),
        marker => Err(ProtocolError::InvalidTypeMarker(marker)),
    }
}

/// Decode a bulk string body ($len\r\n...\r\n).
fn decode_bulk(cursor: &mut Cursor<'_>) -> Result<Frame, ProtocolError> {
    let len = cursor.read_integer()?;

    if len == -1 {
        return Ok(Frame::Null);
    }
    if len < 0 {
        return Err(ProtocolError::InvalidBulkLength(len));
    }

    let len = usize::try_from(len).map_err(|_| ProtocolError::InvalidBulkLength(len))?;
    if len > MAX_BULK_SIZE {
        return Err(ProtocolError::BulkTooLarge {
            len,
            max: MAX_BULK_SIZE,
        });
    }

    let data = cursor.read_exact(len)?;
    if cursor.read_exact(2)? != b"\r\n" {
        return Err(ProtocolError::MissingCrlf);
    }

    Ok(Frame::Bulk(Bytes::copy_from_slice(data)))
}

/// Decode an array header (*len\r\n). An empty array is already complete.
fn decode_array_header(cursor: &mut Cursor<'_>, depth: usize) -> Result<Step, ProtocolError> {
    let len = cursor.read_integer()?;
    if len < 0 {
        return Err(ProtocolError::InvalidArrayLength(len));
    }

    let len = usize::try_from(len).map_err(|_| ProtocolError::InvalidArrayLength(len))?;
    if len > MAX_ARGUMENTS {
        return Err(ProtocolError::TooManyElements {
            count: len,
            max: MAX_ARGUMENTS,
        });
    }
    if depth >= MAX_NESTING_DEPTH {
        return Err(ProtocolError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }

    if len == 0 {
        Ok(Step::Frame(Frame::Array(Vec::new())))
    } else {
        Ok(Step::ArrayHeader(len))
    }
}

/// Find CRLF in a byte slice.
///
/// Uses memchr for the `\r` search, then verifies `\n` follows.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    let mut offset = 0;
    while offset < buf.len().saturating_sub(1) {
        match memchr(b'\r', &buf[offset..]) {
            Some(pos) => {
                let abs_pos = offset + pos;
                if abs_pos + 1 < buf.len() && buf[abs_pos + 1] == b'\n' {
                    return Some(abs_pos);
                }
                offset = abs_pos + 1;
            }
            None => return None,
        }
    }
    None
}

/// Parse a single frame from a byte slice (for testing and one-shot parsing).
///
/// A slice holding only part of a frame yields `UnexpectedEof`.
pub fn parse_frame(data: &[u8]) -> Result<Frame, ProtocolError> {
    let mut parser = RespParser::new();
    parser.extend(data);
    match parser.parse()? {
        Some(frame) => Ok(frame),
        None => Err(ProtocolError::UnexpectedEof),
    }
}


/// Property-based tests using proptest.
#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_frame() -> impl Strategy<Value = Frame> {
        let leaf = prop_oneof![
            "[a-zA-Z0-9 ]{0,32}".prop_map(Frame::Simple),
            "[a-zA-Z0-9 ]{0,32}".prop_map(Frame::Error),
            any::<i64>().prop_map(Frame::Integer),
            prop::collection::vec(any::<u8>(), 0..64).prop_map(|b| Frame::Bulk(Bytes::from(b))),
            Just(Frame::Null),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop::collection::vec(inner, 0..8).prop_map(Frame::Array)
        })
    }

    proptest! {
        /// Parser should never panic on arbitrary input.
        #[test]
        fn parser_never_panics(data: Vec<u8>) {
            let mut parser = RespParser::new();
            parser.extend(&data);
            let _ = parser.parse();
        }

        /// Every constructible frame decodes back to itself.
        #[test]
        fn frame_roundtrip(frame in arb_frame()) {
            let encoded = frame.to_vec();
            let decoded = parse_frame(&encoded).unwrap();
            prop_assert_eq!(decoded, frame);
        }

        /// Any strict prefix of an encoded frame is reported as incomplete.
        #[test]
        fn prefix_is_incomplete(frame in arb_frame(), cut in any::<prop::sample::Index>()) {
            let encoded = frame.to_vec();
            let cut = cut.index(encoded.len());
            let mut parser = RespParser::new();
            parser.extend(&encoded[..cut]);
            prop_assert_eq!(parser.parse().unwrap(), None);
            parser.extend(&encoded[cut..]);
            prop_assert_eq!(parser.parse().unwrap(), Some(frame));
        }

        /// Feeding a pipeline in arbitrary chunk sizes yields the same frames.
        #[test]
        fn chunked_feed_matches_whole(frames in prop::collection::vec(arb_frame(), 1..8),
                                      chunk in 1usize..64) {
            let encoded: Vec<u8> = frames.iter().flat_map(|f| f.to_vec()).collect();
            let mut parser = RespParser::new();
            let mut got = Vec::new();
            for piece in encoded.chunks(chunk) {
                parser.extend(piece);
                while let Some(frame) = parser.parse().unwrap() {
                    got.push(frame);
                }
            }
            prop_assert_eq!(got, frames);
            prop_assert!(parser.finish().is_ok());
        }

        /// find_crlf should always find CRLF if present.
        #[test]
        fn find_crlf_always_finds(prefix in prop::collection::vec(any::<u8>(), 0..100),
                                  suffix in prop::collection::vec(any::<u8>(), 0..100)) {
            let prefix: Vec<u8> = prefix.into_iter()
                .filter(|&b| b != b'\r' && b != b'\n')
                .collect();

            let mut data = prefix.clone();
            data.extend_from_slice(b"\r\n");
            data.extend_from_slice(&suffix);

            let pos = find_crlf(&data);
            prop_assert_eq!(pos, Some(prefix.len()));
        }
    }
}
