//! Fuzz target for the RESP parser.
//!
//! Arbitrary bytes, fed whole and then one byte at a time, must never
//! panic and must produce the same frames either way.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sack::RespParser;

fuzz_target!(|data: &[u8]| {
    let mut whole = RespParser::new();
    whole.extend(data);
    let mut expected = Vec::new();
    while let Ok(Some(frame)) = whole.parse() {
        expected.push(frame);
    }

    let mut trickle = RespParser::new();
    let mut got = Vec::new();
    for byte in data {
        trickle.extend(std::slice::from_ref(byte));
        match trickle.parse() {
            Ok(Some(frame)) => got.push(frame),
            Ok(None) => {}
            Err(_) => break,
        }
    }

    // The byte-at-a-time run can stop early on an error the whole run
    // also hit, so it only ever sees a prefix.
    assert!(got.len() <= expected.len());
    assert_eq!(got[..], expected[..got.len()]);
});
