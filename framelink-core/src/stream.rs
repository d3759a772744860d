//! Framed duplex link over a byte transport
//!
//! [`FrameStream`] owns one transport and one codec. Incoming bytes are
//! reassembled on the transport's delivery thread; while the link is armed,
//! every sliced frame is queued for the single consumer, otherwise it is
//! dropped. The consumer pulls frames with [`FrameStream::receive`] or runs a
//! bounded exchange (see [`crate::exchange`]).

use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::reassembler::Reassembler;
use crate::transport::{ByteSink, Transport};
use crate::types::FrameCodec;
use crate::Result;
use core::time::Duration;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// State shared with the delivery callback
struct Inbound<F> {
    receiving: AtomicBool,
    queue: Sender<F>,
}

/// A framed link: reassembles incoming frames and formats outgoing ones
pub struct FrameStream<C: FrameCodec> {
    codec: Arc<C>,
    inbound: Arc<Inbound<C::Frame>>,
    queue: Receiver<C::Frame>,
    transport: Mutex<Option<Box<dyn Transport>>>,
    poll_quantum: Duration,
}

impl<C: FrameCodec> FrameStream<C> {
    /// Open `transport` and start reassembling frames with `codec`
    pub fn open<T>(transport: T, codec: C) -> Result<Self>
    where
        T: Transport + 'static,
    {
        Self::open_with_config(transport, codec, &LinkConfig::default())
    }

    /// Open `transport` with explicit link settings
    pub fn open_with_config<T>(mut transport: T, codec: C, config: &LinkConfig) -> Result<Self>
    where
        T: Transport + 'static,
    {
        let codec = Arc::new(codec);
        let (tx, rx) = channel::unbounded();
        let inbound = Arc::new(Inbound {
            receiving: AtomicBool::new(false),
            queue: tx,
        });

        let mut reassembler = Reassembler::with_capacity(codec.clone(), config.buffer_capacity);
        let shared = inbound.clone();
        let sink: ByteSink = Box::new(move |bytes: &[u8]| {
            reassembler.push(bytes, |frame| {
                if shared.receiving.load(Ordering::Acquire) {
                    // The receiver lives as long as `shared`, so this cannot fail.
                    let _ = shared.queue.send(frame);
                } else {
                    #[cfg(feature = "logging")]
                    trace!("Dropping frame received while not armed");
                }
            });
        });

        transport
            .open(sink)
            .map_err(|e| LinkError::TransportOpen(e.to_string()))?;

        #[cfg(feature = "logging")]
        debug!("Frame stream opened (poll quantum {:?})", config.poll_quantum());

        let transport: Box<dyn Transport> = Box::new(transport);
        Ok(Self {
            codec,
            inbound,
            queue: rx,
            transport: Mutex::new(Some(transport)),
            poll_quantum: config.poll_quantum(),
        })
    }

    /// Format `frame` and write it to the transport on the calling thread
    pub fn send(&self, frame: &C::Frame) -> Result<()> {
        let bytes = self.codec.format_outgoing(frame).ok_or(LinkError::Format)?;

        let mut transport = self.transport.lock().unwrap_or_else(PoisonError::into_inner);
        let transport = transport.as_mut().ok_or(LinkError::Closed)?;
        transport
            .write(&bytes)
            .map_err(|e| LinkError::TransportWrite(e.to_string()))?;

        #[cfg(feature = "logging")]
        trace!("Sent {} bytes", bytes.len());

        Ok(())
    }

    /// Arm or disarm the link
    ///
    /// Arming first discards every queued frame, so an exchange never sees
    /// frames left over from an earlier one. Disarming leaves the queue as is.
    pub fn set_receiving(&self, receiving: bool) {
        if receiving {
            let _stale = self.queue.try_iter().count();

            #[cfg(feature = "logging")]
            debug!("Armed; discarded {} stale frames", _stale);
        }

        self.inbound.receiving.store(receiving, Ordering::Release);
    }

    /// Whether sliced frames are currently being queued
    pub fn is_receiving(&self) -> bool {
        self.inbound.receiving.load(Ordering::Acquire)
    }

    /// Arm the link until the returned guard is dropped
    pub fn arm(&self) -> ReceivingGuard<'_, C> {
        self.set_receiving(true);
        ReceivingGuard { stream: self }
    }

    /// Wait up to `timeout` for the next queued frame
    ///
    /// Returns `Ok(None)` when nothing arrived in time. Calling this while the
    /// link is not armed is a usage error and fails immediately.
    pub fn receive(&self, timeout: Duration) -> Result<Option<C::Frame>> {
        if !self.is_receiving() {
            return Err(LinkError::NotReceiving);
        }

        match self.queue.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    /// Receive quantum used by [`FrameStream::exchange`]
    pub fn poll_quantum(&self) -> Duration {
        self.poll_quantum
    }

    /// The codec in use
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Whether the transport is still open
    pub fn is_open(&self) -> bool {
        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Close the transport; further sends fail with [`LinkError::Closed`]
    ///
    /// Closing an already closed stream does nothing.
    pub fn close(&self) {
        let transport = self
            .transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(mut transport) = transport {
            transport.close();

            #[cfg(feature = "logging")]
            debug!("Frame stream closed");
        }
    }
}

impl<C: FrameCodec> Drop for FrameStream<C> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Keeps a [`FrameStream`] armed; disarms it when dropped
pub struct ReceivingGuard<'a, C: FrameCodec> {
    stream: &'a FrameStream<C>,
}

impl<C: FrameCodec> core::ops::Deref for ReceivingGuard<'_, C> {
    type Target = FrameStream<C>;

    fn deref(&self) -> &FrameStream<C> {
        self.stream
    }
}

impl<C: FrameCodec> Drop for ReceivingGuard<'_, C> {
    fn drop(&mut self) {
        self.stream.set_receiving(false);
    }
}
