//! Length-prefixed binary packets with an optional CRC32C trailer
//!
//! Layout:
//! 1. Payload length (2 bytes, big-endian)
//! 2. Payload (variable length)
//! 3. CRC32C over length + payload (4 bytes, big-endian), when enabled

use crate::constants::{CRC32C_SIZE, LENGTH_PREFIX_SIZE, MAX_PACKET_PAYLOAD};
use crate::error::LinkError;
use crate::types::{FrameCodec, Sliced};
use bytes::{BufMut, Bytes, BytesMut};

/// A decoded packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet payload
    pub payload: Bytes,

    /// Set when the checksum trailer did not match
    pub corrupt: bool,
}

impl Packet {
    /// Create an intact packet
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            corrupt: false,
        }
    }

    /// Take the payload, rejecting packets that failed their checksum
    pub fn into_payload(self) -> Result<Bytes, LinkError> {
        if self.corrupt {
            return Err(LinkError::InvalidFrame(format!(
                "checksum mismatch on {}-byte packet",
                self.payload.len()
            )));
        }
        Ok(self.payload)
    }
}

/// Codec for `u16` length-prefixed packets
#[derive(Debug, Clone, Default)]
pub struct LengthPrefixedCodec {
    crc: bool,
}

impl LengthPrefixedCodec {
    /// Create a codec without a checksum trailer
    pub fn new() -> Self {
        Self { crc: false }
    }

    /// Create a codec that appends and verifies a CRC32C trailer
    pub fn with_crc32c() -> Self {
        Self { crc: true }
    }

    fn trailer_size(&self) -> usize {
        if self.crc {
            CRC32C_SIZE
        } else {
            0
        }
    }
}

impl FrameCodec for LengthPrefixedCodec {
    type Frame = Packet;

    fn slice_incoming(&self, buf: &[u8]) -> Option<Sliced<Packet>> {
        if buf.len() < LENGTH_PREFIX_SIZE {
            return None;
        }

        let payload_len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        let body_len = LENGTH_PREFIX_SIZE + payload_len;
        let total = body_len + self.trailer_size();
        if buf.len() < total {
            return None;
        }

        let payload = Bytes::copy_from_slice(&buf[LENGTH_PREFIX_SIZE..body_len]);
        let corrupt = self.crc && {
            let expected = u32::from_be_bytes([
                buf[body_len],
                buf[body_len + 1],
                buf[body_len + 2],
                buf[body_len + 3],
            ]);
            crc32c::crc32c(&buf[..body_len]) != expected
        };

        Some(Sliced::new(Packet { payload, corrupt }, total))
    }

    fn format_outgoing(&self, frame: &Packet) -> Option<Bytes> {
        if frame.payload.len() > MAX_PACKET_PAYLOAD {
            return None;
        }

        let mut buf =
            BytesMut::with_capacity(LENGTH_PREFIX_SIZE + frame.payload.len() + self.trailer_size());
        buf.put_u16(frame.payload.len() as u16);
        buf.put_slice(&frame.payload);
        if self.crc {
            let checksum = crc32c::crc32c(&buf);
            buf.put_u32(checksum);
        }
        Some(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waits_for_length_and_body() {
        let codec = LengthPrefixedCodec::new();
        assert!(codec.slice_incoming(&[0x00]).is_none());
        assert!(codec.slice_incoming(&[0x00, 0x03, b'a', b'b']).is_none());

        let sliced = codec.slice_incoming(&[0x00, 0x03, b'a', b'b', b'c', 0x99]).unwrap();
        assert_eq!(sliced.frame, Packet::new(&b"abc"[..]));
        assert_eq!(sliced.consumed, 5);
    }

    #[test]
    fn test_crc_round_trip() {
        let codec = LengthPrefixedCodec::with_crc32c();
        let packet = Packet::new(&b"\x01\x02\x03"[..]);

        let wire = codec.format_outgoing(&packet).unwrap();
        assert_eq!(wire.len(), 2 + 3 + 4);

        let sliced = codec.slice_incoming(&wire).unwrap();
        assert_eq!(sliced, Sliced::new(packet, wire.len()));
    }

    #[test]
    fn test_corrupt_packet_is_flagged() {
        let codec = LengthPrefixedCodec::with_crc32c();
        let mut wire = codec
            .format_outgoing(&Packet::new(&b"payload"[..]))
            .unwrap()
            .to_vec();
        wire[3] ^= 0xff;

        let sliced = codec.slice_incoming(&wire).unwrap();
        assert!(sliced.frame.corrupt);
        assert_eq!(sliced.consumed, wire.len());
        assert!(matches!(
            sliced.frame.into_payload(),
            Err(LinkError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_empty_payload() {
        let codec = LengthPrefixedCodec::new();
        let wire = codec.format_outgoing(&Packet::new(Bytes::new())).unwrap();
        assert_eq!(&wire[..], &[0x00, 0x00]);
        assert_eq!(codec.slice_incoming(&wire).unwrap().consumed, 2);
    }

    #[test]
    fn test_oversized_payload_cannot_be_formatted() {
        let packet = Packet::new(vec![0u8; MAX_PACKET_PAYLOAD + 1]);
        assert!(LengthPrefixedCodec::new().format_outgoing(&packet).is_none());
    }
}
