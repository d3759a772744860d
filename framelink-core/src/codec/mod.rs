//! Reference codecs for common serial device framings

mod length_prefixed;
mod line;

pub use length_prefixed::{LengthPrefixedCodec, Packet};
pub use line::LineCodec;
