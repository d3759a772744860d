//! Defaults and limits shared across the link

use core::time::Duration;

/// Default receive quantum used by exchanges (re-checks `wants_more` about 4x/s)
pub const DEFAULT_POLL_QUANTUM: Duration = Duration::from_millis(250);

/// Default initial capacity of the raw receive buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Default size of a single read performed by stream transports
pub const DEFAULT_READ_CHUNK_SIZE: usize = 512;

/// Default baud rate for serial ports
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Read timeout of serial ports, bounding how long the reader thread takes to notice a close
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// How long closing a stream transport waits for its reader thread to exit
pub const READER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Smallest receive quantum; a zero quantum would spin the exchange loop
pub const MIN_POLL_QUANTUM: Duration = Duration::from_millis(1);

/// Size of the length prefix used by [`crate::codec::LengthPrefixedCodec`]
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Size of the optional CRC32C trailer used by [`crate::codec::LengthPrefixedCodec`]
pub const CRC32C_SIZE: usize = 4;

/// Largest payload a length-prefixed packet can carry
pub const MAX_PACKET_PAYLOAD: usize = u16::MAX as usize;

/// Line terminator byte used by [`crate::codec::LineCodec`]
pub const LINE_FEED: u8 = b'\n';

/// Optional carriage return stripped before the line terminator
pub const CARRIAGE_RETURN: u8 = b'\r';
