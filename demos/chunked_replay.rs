//! Example showing that reassembly does not depend on how bytes are chunked

use bytes::Bytes;
use framelink_core::{
    codec::{LengthPrefixedCodec, Packet},
    FrameCodec, Reassembler,
};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Framelink Chunked Replay Example\n");

    let codec = LengthPrefixedCodec::with_crc32c();

    // Step 1: Encode a handful of packets into one byte stream
    let mut stream = Vec::new();
    for i in 1..=5 {
        let payload = format!("reading {} from sensor", i);
        let wire = codec
            .format_outgoing(&Packet::new(Bytes::from(payload)))
            .ok_or("packet too large")?;
        stream.extend_from_slice(&wire);
    }
    println!("Encoded {} bytes\n", stream.len());

    // Step 2: Replay it with several chunk sizes
    for chunk in [1usize, 7, 64, stream.len()] {
        let mut reassembler = Reassembler::new(Arc::new(codec.clone()));
        let mut payloads = Vec::new();

        for piece in stream.chunks(chunk) {
            for packet in reassembler.push_collect(piece) {
                payloads.push(packet.into_payload()?);
            }
        }

        println!(
            "chunk size {:>4}: {} packets, {} bytes left over",
            chunk,
            payloads.len(),
            reassembler.len()
        );
    }

    Ok(())
}
