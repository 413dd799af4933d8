//! Fuzz target for Frame serialization/deserialization.
//!
//! Any frame the server can build must decode back to itself.

#![no_main]

use arbitrary::Arbitrary;
use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use sack::{Frame, RespParser};

#[derive(Arbitrary, Debug)]
enum FuzzFrame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Vec<u8>),
    Null,
    Array(Vec<FuzzFrame>),
}

impl From<FuzzFrame> for Frame {
    fn from(f: FuzzFrame) -> Self {
        match f {
            // Simple strings and errors are single lines on the wire.
            FuzzFrame::Simple(s) => Frame::Simple(s.replace(['\r', '\n'], "")),
            FuzzFrame::Error(s) => Frame::Error(s.replace(['\r', '\n'], "")),
            FuzzFrame::Integer(i) => Frame::Integer(i),
            FuzzFrame::Bulk(b) => Frame::Bulk(b.into()),
            FuzzFrame::Null => Frame::Null,
            FuzzFrame::Array(arr) => Frame::Array(arr.into_iter().map(Into::into).collect()),
        }
    }
}

fuzz_target!(|frame: FuzzFrame| {
    let frame: Frame = frame.into();

    let mut buffer = BytesMut::new();
    frame.serialize(&mut buffer);
    assert_eq!(buffer.len(), frame.serialized_size());

    // Deeply nested arrays are allowed to be rejected, nothing else is.
    let mut parser = RespParser::new();
    parser.extend(&buffer);
    if let Ok(parsed) = parser.parse() {
        assert_eq!(parsed, Some(frame));
        assert!(parser.is_empty());
    }
});
