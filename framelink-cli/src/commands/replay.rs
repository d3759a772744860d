use crate::CodecKind;
use anyhow::{bail, Context, Result};
use framelink_core::codec::{LengthPrefixedCodec, LineCodec};
use framelink_core::reassembler::ReassemblyStats;
use framelink_core::{FrameCodec, Reassembler};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayedFrame {
    pub index: usize,
    pub len: usize,
    pub text: Option<String>,
    pub hex: Option<String>,
    pub corrupt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub bytes_received: usize,
    pub bytes_consumed: usize,
    pub leftover: usize,
    pub stalls: usize,
    pub frames: Vec<ReplayedFrame>,
}

fn run<C, F>(codec: C, data: &[u8], chunk: usize, describe: F) -> ReplayReport
where
    C: FrameCodec,
    F: Fn(usize, C::Frame) -> ReplayedFrame,
{
    let mut reassembler = Reassembler::new(Arc::new(codec));
    let mut frames = Vec::new();

    for piece in data.chunks(chunk) {
        reassembler.push(piece, |frame| {
            let index = frames.len();
            frames.push(describe(index, frame));
        });
    }

    let ReassemblyStats {
        bytes_received,
        bytes_consumed,
        stalls,
        ..
    } = *reassembler.stats();

    ReplayReport {
        bytes_received,
        bytes_consumed,
        leftover: reassembler.len(),
        stalls,
        frames,
    }
}

/// Feed `data` through the chosen codec in `chunk`-sized deliveries
pub fn replay(data: &[u8], codec: CodecKind, crc: bool, chunk: usize) -> Result<ReplayReport> {
    if chunk == 0 {
        bail!("Chunk size must be at least 1");
    }

    let report = match codec {
        CodecKind::Line => run(LineCodec::new(), data, chunk, |index, line| ReplayedFrame {
            index,
            len: line.len(),
            text: Some(line),
            hex: None,
            corrupt: false,
        }),
        CodecKind::Length => {
            let codec = if crc {
                LengthPrefixedCodec::with_crc32c()
            } else {
                LengthPrefixedCodec::new()
            };
            run(codec, data, chunk, |index, packet| ReplayedFrame {
                index,
                len: packet.payload.len(),
                text: None,
                hex: Some(hex::encode(&packet.payload)),
                corrupt: packet.corrupt,
            })
        }
    };

    Ok(report)
}

pub fn execute(
    input: &str,
    codec: CodecKind,
    crc: bool,
    chunk: usize,
    output: Option<&str>,
) -> Result<()> {
    info!("Replaying capture: {}", input);

    let data = fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?;

    info!("Capture size: {} bytes, chunk size: {}", data.len(), chunk);

    let report = replay(&data, codec, crc, chunk)?;

    println!("\n=== Replay Results ===");
    println!("Bytes received:    {} bytes", report.bytes_received);
    println!("Bytes consumed:    {} bytes", report.bytes_consumed);
    println!("Frames:            {}", report.frames.len());
    println!(
        "Corrupt frames:    {}",
        report.frames.iter().filter(|f| f.corrupt).count()
    );
    println!("Leftover bytes:    {}", report.leftover);
    println!();

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&report)
            .with_context(|| "Failed to serialize replay report")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Replay report written to: {}", output_path);
    } else {
        println!("=== Frames ===");
        for frame in &report.frames {
            let body = frame.text.as_deref().or(frame.hex.as_deref()).unwrap_or("");
            let flag = if frame.corrupt { " [corrupt]" } else { "" };
            println!("#{} ({} bytes){}: {}", frame.index, frame.len, flag, body);
        }
    }

    Ok(())
}
