//! Incremental frame reassembly over a growing byte buffer
//!
//! Bytes arrive in arbitrary chunks. Each push appends to a single `BytesMut`
//! buffer and then asks the codec for frames until it reports that no complete
//! frame is buffered. The buffer always holds exactly the bytes not yet
//! consumed by a slice.

use crate::constants::DEFAULT_BUFFER_CAPACITY;
use crate::types::{FrameCodec, Sliced};
use bytes::{Buf, BytesMut};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{trace, warn};

/// Reassembly statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReassemblyStats {
    /// Total bytes pushed
    pub bytes_received: usize,

    /// Total bytes consumed by sliced frames
    pub bytes_consumed: usize,

    /// Number of frames sliced
    pub frames: usize,

    /// Number of slices rejected for consuming zero bytes
    pub stalls: usize,
}

/// Buffer plus codec, turning byte chunks into frames
pub struct Reassembler<C: FrameCodec> {
    codec: Arc<C>,
    buffer: BytesMut,
    stats: ReassemblyStats,
}

impl<C: FrameCodec> Reassembler<C> {
    /// Create a reassembler with the default buffer capacity
    pub fn new(codec: Arc<C>) -> Self {
        Self::with_capacity(codec, DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a reassembler with a custom initial buffer capacity
    pub fn with_capacity(codec: Arc<C>, capacity: usize) -> Self {
        Self {
            codec,
            buffer: BytesMut::with_capacity(capacity),
            stats: ReassemblyStats::default(),
        }
    }

    /// Append `data` and hand every complete frame to `emit`, in order
    ///
    /// Returns the number of frames emitted by this push.
    pub fn push<F>(&mut self, data: &[u8], mut emit: F) -> usize
    where
        F: FnMut(C::Frame),
    {
        self.buffer.extend_from_slice(data);
        self.stats.bytes_received += data.len();

        let mut emitted = 0;
        while let Some(Sliced { frame, consumed }) = self.codec.slice_incoming(&self.buffer) {
            if consumed == 0 {
                // A zero-length slice can never advance the buffer; treat it as
                // "need more data" instead of spinning on it forever.
                self.stats.stalls += 1;

                #[cfg(feature = "logging")]
                warn!(
                    "Codec sliced a frame without consuming bytes ({} buffered); waiting for more data",
                    self.buffer.len()
                );

                break;
            }

            let consumed = if consumed > self.buffer.len() {
                #[cfg(feature = "logging")]
                warn!(
                    "Codec reported {} bytes consumed but only {} are buffered",
                    consumed,
                    self.buffer.len()
                );
                self.buffer.len()
            } else {
                consumed
            };

            self.buffer.advance(consumed);
            self.stats.bytes_consumed += consumed;
            self.stats.frames += 1;
            emitted += 1;

            #[cfg(feature = "logging")]
            trace!("Sliced frame of {} bytes, {} left buffered", consumed, self.buffer.len());

            emit(frame);
        }

        emitted
    }

    /// Append `data` and collect the complete frames
    pub fn push_collect(&mut self, data: &[u8]) -> Vec<C::Frame> {
        let mut frames = Vec::new();
        self.push(data, |frame| frames.push(frame));
        frames
    }

    /// Bytes buffered but not yet sliced
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Statistics since creation
    pub fn stats(&self) -> &ReassemblyStats {
        &self.stats
    }

    /// Drop buffered bytes
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
