//! Byte transports underneath a framed link
//!
//! A transport delivers raw bytes to a sink registered at open time, on a
//! thread of its choosing, one delivery at a time. Writes happen synchronously
//! on the caller's thread.

mod mock;
mod stream;

pub use mock::{MockPeer, MockTransport};
pub use stream::{SerialTransport, StreamTransport};

use std::io;

/// Callback receiving raw bytes from the transport
pub type ByteSink = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// A raw, ordered, reliable byte link
pub trait Transport: Send {
    /// Open the link and start delivering incoming bytes to `sink`
    ///
    /// The sink must be registered before this returns so that no byte
    /// arriving after a successful open is lost.
    fn open(&mut self, sink: ByteSink) -> io::Result<()>;

    /// Write all of `bytes` to the link
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Close the link and stop delivery
    fn close(&mut self);
}
