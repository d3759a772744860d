//! Core types for Framelink codecs

use bytes::Bytes;

/// A frame decoded from the front of the receive buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sliced<T> {
    /// The decoded frame
    pub frame: T,

    /// Number of bytes the frame occupied at the start of the buffer
    pub consumed: usize,
}

impl<T> Sliced<T> {
    /// Create a new sliced frame
    pub fn new(frame: T, consumed: usize) -> Self {
        Self { frame, consumed }
    }
}

/// Device-specific framing rules
///
/// Implementations are pure: `slice_incoming` looks at the buffered prefix and
/// either decodes one complete frame from its start or reports that more bytes
/// are needed. It must never fail; input the codec cannot make sense of is its
/// own to skip or flag on the returned frame.
pub trait FrameCodec: Send + Sync + 'static {
    /// Decoded unit exchanged over the link
    type Frame: Send + 'static;

    /// Slice one frame from the start of `buf`, or `None` if no complete frame is buffered yet
    fn slice_incoming(&self, buf: &[u8]) -> Option<Sliced<Self::Frame>>;

    /// Serialize a frame for the wire, or `None` if it cannot be represented
    fn format_outgoing(&self, frame: &Self::Frame) -> Option<Bytes>;
}
