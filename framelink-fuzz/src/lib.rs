//! Fuzzing entry points for framelink-core reassembly
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_reassemble

use framelink_core::codec::{LengthPrefixedCodec, LineCodec};
use framelink_core::{FrameCodec, Reassembler};
use std::sync::Arc;

fn reassemble<C: FrameCodec>(codec: C, data: &[u8]) {
    // First byte picks the delivery chunk size
    let (chunk, rest) = match data.split_first() {
        Some((&c, rest)) => (usize::from(c).max(1), rest),
        None => (1, data),
    };

    let mut reassembler = Reassembler::new(Arc::new(codec));
    for piece in rest.chunks(chunk) {
        let _ = reassembler.push_collect(piece);
    }
    assert!(reassembler.len() <= rest.len());
}

pub fn fuzz_reassemble(data: &[u8]) {
    // Should never panic or spin, whatever the input
    reassemble(LineCodec::new(), data);
    reassemble(LengthPrefixedCodec::new(), data);
    reassemble(LengthPrefixedCodec::with_crc32c(), data);
}

pub fn fuzz_slice(data: &[u8]) {
    let _ = LineCodec::new().slice_incoming(data);
    let _ = LengthPrefixedCodec::with_crc32c().slice_incoming(data);
}
