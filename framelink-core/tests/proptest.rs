//! Property-based tests using proptest

use bytes::Bytes;
use framelink_core::{
    codec::{LengthPrefixedCodec, LineCodec, Packet},
    FrameCodec, Reassembler, Sliced,
};
use proptest::prelude::*;
use std::sync::Arc;

/// Split `data` at the given cut points (taken modulo the length, deduplicated).
fn split_at_cuts(data: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    if data.is_empty() {
        return vec![Vec::new()];
    }

    let mut points: Vec<usize> = cuts.iter().map(|c| c % data.len()).collect();
    points.push(0);
    points.push(data.len());
    points.sort_unstable();
    points.dedup();

    points.windows(2).map(|w| data[w[0]..w[1]].to_vec()).collect()
}

proptest! {
    #[test]
    fn prop_chunk_boundaries_do_not_matter(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..20),
        cuts in prop::collection::vec(any::<usize>(), 0..40),
        crc in any::<bool>(),
    ) {
        let codec = if crc { LengthPrefixedCodec::with_crc32c() } else { LengthPrefixedCodec::new() };
        let packets: Vec<Packet> = payloads.into_iter().map(Packet::new).collect();

        let mut wire = Vec::new();
        for packet in &packets {
            wire.extend_from_slice(&codec.format_outgoing(packet).unwrap());
        }

        let mut reassembler = Reassembler::new(Arc::new(codec));
        let mut received = Vec::new();
        for chunk in split_at_cuts(&wire, &cuts) {
            reassembler.push(&chunk, |packet| received.push(packet));
        }

        prop_assert_eq!(received, packets);
        prop_assert!(reassembler.is_empty());
    }

    #[test]
    fn prop_lines_survive_any_split(
        lines in prop::collection::vec("[a-zA-Z0-9 ]{0,32}", 1..20),
        cuts in prop::collection::vec(any::<usize>(), 0..40),
    ) {
        let codec = LineCodec::new();
        let mut wire = Vec::new();
        for line in &lines {
            wire.extend_from_slice(&codec.format_outgoing(line).unwrap());
        }

        let mut reassembler = Reassembler::new(Arc::new(codec));
        let mut received = Vec::new();
        for chunk in split_at_cuts(&wire, &cuts) {
            received.extend(reassembler.push_collect(&chunk));
        }

        prop_assert_eq!(received, lines);
    }

    #[test]
    fn prop_format_then_slice_is_identity(
        payload in prop::collection::vec(any::<u8>(), 0..2048),
        crc in any::<bool>(),
    ) {
        let codec = if crc { LengthPrefixedCodec::with_crc32c() } else { LengthPrefixedCodec::new() };
        let packet = Packet::new(Bytes::from(payload));

        let wire = codec.format_outgoing(&packet).unwrap();

        prop_assert_eq!(codec.slice_incoming(&wire), Some(Sliced::new(packet, wire.len())));
    }

    #[test]
    fn prop_reassembly_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..4096)
    ) {
        let mut lines = Reassembler::new(Arc::new(LineCodec::new()));
        let mut packets = Reassembler::new(Arc::new(LengthPrefixedCodec::with_crc32c()));

        let _ = lines.push_collect(&data);
        let _ = packets.push_collect(&data);

        prop_assert!(lines.len() <= data.len());
        prop_assert!(packets.len() <= data.len());
    }
}
