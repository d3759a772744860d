//! Newline-terminated text lines, as spoken by most AT-style command consoles

use crate::constants::{CARRIAGE_RETURN, LINE_FEED};
use crate::types::{FrameCodec, Sliced};
use bytes::{BufMut, Bytes, BytesMut};

/// Codec for `\n`-terminated lines
///
/// Incoming lines have their terminator and an optional trailing `\r`
/// removed; invalid UTF-8 is replaced rather than rejected. Outgoing lines are
/// terminated with `\r\n` (or `\n` when CRLF is disabled) and must not contain
/// a line feed themselves.
#[derive(Debug, Clone)]
pub struct LineCodec {
    crlf: bool,
}

impl LineCodec {
    /// Create a codec that writes `\r\n` terminators
    pub fn new() -> Self {
        Self { crlf: true }
    }

    /// Create a codec that writes bare `\n` terminators
    pub fn lf_only() -> Self {
        Self { crlf: false }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec for LineCodec {
    type Frame = String;

    fn slice_incoming(&self, buf: &[u8]) -> Option<Sliced<String>> {
        let end = memchr::memchr(LINE_FEED, buf)?;

        let mut line = &buf[..end];
        if let Some((&CARRIAGE_RETURN, rest)) = line.split_last() {
            line = rest;
        }

        Some(Sliced::new(String::from_utf8_lossy(line).into_owned(), end + 1))
    }

    fn format_outgoing(&self, frame: &String) -> Option<Bytes> {
        if memchr::memchr(LINE_FEED, frame.as_bytes()).is_some() {
            return None;
        }

        let mut buf = BytesMut::with_capacity(frame.len() + 2);
        buf.put_slice(frame.as_bytes());
        if self.crlf {
            buf.put_u8(CARRIAGE_RETURN);
        }
        buf.put_u8(LINE_FEED);
        Some(buf.freeze())
    }
}
