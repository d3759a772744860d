//! In-memory transport for tests and demos

use super::{ByteSink, Transport};
use bytes::Bytes;
use crossbeam::channel::{self, Sender};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

#[cfg(feature = "logging")]
use tracing::debug;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static>;

#[derive(Default)]
struct Shared {
    sink: Mutex<Option<ByteSink>>,
    written: Mutex<Vec<Bytes>>,
    responder: Mutex<Option<Responder>>,
    open: AtomicBool,
    fail_open: AtomicBool,
    fail_writes: AtomicBool,
}

impl Shared {
    fn deliver(&self, bytes: &[u8]) -> bool {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        match sink.as_mut() {
            Some(sink) => {
                sink(bytes);
                true
            }
            None => false,
        }
    }
}

/// Transport half handed to the link
pub struct MockTransport {
    shared: Arc<Shared>,
    replies: Option<Sender<Vec<u8>>>,
}

/// Test-side handle: injects incoming bytes and inspects writes
#[derive(Clone)]
pub struct MockPeer {
    shared: Arc<Shared>,
}

impl MockTransport {
    /// Create a connected transport/peer pair
    pub fn new() -> (Self, MockPeer) {
        let shared = Arc::new(Shared::default());
        let peer = MockPeer {
            shared: shared.clone(),
        };
        (
            Self {
                shared,
                replies: None,
            },
            peer,
        )
    }

    /// Create a pair whose transport refuses to open
    pub fn failing_open() -> (Self, MockPeer) {
        let (transport, peer) = Self::new();
        transport.shared.fail_open.store(true, Ordering::SeqCst);
        (transport, peer)
    }
}

impl Transport for MockTransport {
    fn open(&mut self, sink: ByteSink) -> io::Result<()> {
        if self.shared.fail_open.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "mock device unavailable"));
        }

        *self.shared.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
        self.shared.open.store(true, Ordering::SeqCst);

        // Replies from the responder are delivered on a dedicated thread, the
        // way a real transport calls back from its own reader.
        let (tx, rx) = channel::unbounded::<Vec<u8>>();
        let shared = self.shared.clone();
        thread::Builder::new()
            .name("framelink-mock-rx".into())
            .spawn(move || {
                for chunk in rx {
                    if !shared.deliver(&chunk) {
                        break;
                    }
                }
            })?;
        self.replies = Some(tx);

        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.shared.open.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "mock transport is closed"));
        }
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
        }

        self.shared
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Bytes::copy_from_slice(bytes));

        let reply = self
            .shared
            .responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
            .map(|respond| respond(bytes));

        if let (Some(chunks), Some(replies)) = (reply, self.replies.as_ref()) {
            for chunk in chunks {
                // The delivery thread only stops once the transport is closed.
                let _ = replies.send(chunk);
            }
        }

        Ok(())
    }

    fn close(&mut self) {
        #[cfg(feature = "logging")]
        debug!("Closing mock transport");

        self.shared.open.store(false, Ordering::SeqCst);
        self.replies = None;
        self.shared
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl MockPeer {
    /// Deliver `bytes` to the link on the calling thread
    ///
    /// Returns `false` if the transport is not open.
    pub fn deliver(&self, bytes: &[u8]) -> bool {
        self.shared.deliver(bytes)
    }

    /// Everything written by the link so far, one entry per write
    pub fn written(&self) -> Vec<Bytes> {
        self.shared
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of writes performed so far
    pub fn write_count(&self) -> usize {
        self.shared
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Answer every write with the returned chunks, delivered in order on the transport thread
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static,
    {
        *self
            .shared
            .responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(responder));
    }

    /// Whether the transport is currently open
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn recording_sink() -> (ByteSink, channel::Receiver<Vec<u8>>) {
        let (tx, rx) = channel::unbounded();
        let sink: ByteSink = Box::new(move |bytes: &[u8]| {
            let _ = tx.send(bytes.to_vec());
        });
        (sink, rx)
    }

    #[test]
    fn test_deliver_requires_open() {
        let (mut transport, peer) = MockTransport::new();
        assert!(!peer.deliver(b"early"));

        let (sink, rx) = recording_sink();
        transport.open(sink).unwrap();

        assert!(peer.deliver(b"hello"));
        assert_eq!(rx.recv().unwrap(), b"hello");
    }

    #[test]
    fn test_failing_open() {
        let (mut transport, peer) = MockTransport::failing_open();
        let (sink, _rx) = recording_sink();

        assert!(transport.open(sink).is_err());
        assert!(!peer.is_open());
    }

    #[test]
    fn test_responder_replies_in_order() {
        let (mut transport, peer) = MockTransport::new();
        let (sink, rx) = recording_sink();
        transport.open(sink).unwrap();

        peer.set_responder(|req| vec![req.to_vec(), b"!".to_vec()]);
        transport.write(b"ping").unwrap();

        let timeout = Duration::from_secs(1);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), b"ping");
        assert_eq!(rx.recv_timeout(timeout).unwrap(), b"!");
        assert_eq!(peer.write_count(), 1);
    }

    #[test]
    fn test_write_failures() {
        let (mut transport, peer) = MockTransport::new();
        let (sink, _rx) = recording_sink();
        transport.open(sink).unwrap();

        peer.set_fail_writes(true);
        assert!(transport.write(b"x").is_err());

        transport.close();
        peer.set_fail_writes(false);
        assert_eq!(
            transport.write(b"x").unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
        assert!(peer.written().is_empty());
    }
}
