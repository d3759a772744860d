//! Transport over any blocking reader/writer pair, e.g. a serial port

use super::{ByteSink, Transport};
use crate::constants::{DEFAULT_READ_CHUNK_SIZE, DEFAULT_READ_TIMEOUT, READER_SHUTDOWN_TIMEOUT};
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Byte transport backed by a reader thread and a synchronous writer
///
/// Incoming bytes are read in chunks on a background thread named
/// `framelink-rx` and passed to the sink as they arrive.
///
/// The reader must return from `read` periodically (a read timeout surfacing as
/// `TimedOut` or `WouldBlock`) so that [`Transport::close`] can stop and join
/// the thread, which drops the reader and releases the device.
pub struct StreamTransport<R, W> {
    reader: Option<R>,
    writer: Option<W>,
    chunk_size: usize,
    stop: Arc<AtomicBool>,
    worker: Option<Worker>,
}

struct Worker {
    handle: JoinHandle<()>,
    /// Disconnects when the read loop returns
    exited: Receiver<()>,
}

/// Serial port transport as returned by [`StreamTransport::open_serial`]
pub type SerialTransport = StreamTransport<Box<dyn SerialPort>, Box<dyn SerialPort>>;

impl<R, W> StreamTransport<R, W>
where
    R: Read + Send + 'static,
    W: Write + Send,
{
    /// Create a transport from a reader and a writer
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            chunk_size: DEFAULT_READ_CHUNK_SIZE,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Set the size of a single read
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl SerialTransport {
    /// Open a serial port (such as `/dev/ttyACM0` or `COM3`) at `baud_rate`
    ///
    /// Reads time out after [`DEFAULT_READ_TIMEOUT`] so the reader thread can
    /// observe a close request.
    pub fn open_serial(path: &str, baud_rate: u32) -> io::Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(DEFAULT_READ_TIMEOUT)
            .open()?;
        let reader = port.try_clone()?;

        #[cfg(feature = "logging")]
        debug!("Opened serial port {} at {} baud", path, baud_rate);

        Ok(Self::new(reader, port))
    }
}

fn read_loop<R: Read>(mut reader: R, mut sink: ByteSink, chunk_size: usize, stop: Arc<AtomicBool>) {
    let mut buf = vec![0u8; chunk_size];

    while !stop.load(Ordering::Acquire) {
        match reader.read(&mut buf) {
            Ok(0) => {
                #[cfg(feature = "logging")]
                debug!("Transport reached end of stream");
                break;
            }
            Ok(n) => {
                if stop.load(Ordering::Acquire) {
                    break;
                }
                sink(&buf[..n]);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                ) =>
            {
                continue;
            }
            Err(_e) => {
                #[cfg(feature = "logging")]
                warn!("Transport read failed: {}", _e);
                break;
            }
        }
    }
}

impl<R, W> Transport for StreamTransport<R, W>
where
    R: Read + Send + 'static,
    W: Write + Send,
{
    fn open(&mut self, sink: ByteSink) -> io::Result<()> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::AlreadyExists, "transport already opened"))?;

        let stop = self.stop.clone();
        let chunk_size = self.chunk_size;
        let (exit_tx, exited) = channel::bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("framelink-rx".into())
            .spawn(move || {
                let _exit = exit_tx;
                read_loop(reader, sink, chunk_size, stop);
            })?;
        self.worker = Some(Worker { handle, exited });

        #[cfg(feature = "logging")]
        debug!("Stream transport opened (chunk size {})", self.chunk_size);

        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is closed"))?;
        writer.write_all(bytes)?;
        writer.flush()
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.writer = None;

        let Some(worker) = self.worker.take() else {
            return;
        };

        match worker.exited.recv_timeout(READER_SHUTDOWN_TIMEOUT) {
            Err(RecvTimeoutError::Disconnected) | Ok(()) => {
                let _ = worker.handle.join();

                #[cfg(feature = "logging")]
                debug!("Stream transport closed");
            }
            Err(RecvTimeoutError::Timeout) => {
                // The reader never returned from read(); it is released when it does.
                #[cfg(feature = "logging")]
                warn!(
                    "Reader thread still blocked after {:?}; detaching it",
                    READER_SHUTDOWN_TIMEOUT
                );
            }
        }
    }
}
