//! Link configuration

use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_BUFFER_CAPACITY, DEFAULT_POLL_QUANTUM, DEFAULT_READ_CHUNK_SIZE,
    MIN_POLL_QUANTUM,
};
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Tunables for a [`crate::stream::FrameStream`] and its transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Receive quantum used by exchanges, in milliseconds
    pub poll_quantum_ms: u64,

    /// Initial capacity of the raw receive buffer
    pub buffer_capacity: usize,

    /// Size of a single read performed by stream transports
    pub read_chunk_size: usize,

    /// Baud rate used when opening a serial port
    pub baud_rate: u32,
}

impl LinkConfig {
    /// Receive quantum as a [`Duration`], never shorter than [`MIN_POLL_QUANTUM`]
    pub fn poll_quantum(&self) -> Duration {
        Duration::from_millis(self.poll_quantum_ms).max(MIN_POLL_QUANTUM)
    }

    /// Set the receive quantum, rounded down to whole milliseconds (at least one)
    pub fn with_poll_quantum(mut self, quantum: Duration) -> Self {
        let millis = quantum.max(MIN_POLL_QUANTUM).as_millis();
        self.poll_quantum_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            poll_quantum_ms: DEFAULT_POLL_QUANTUM.as_millis() as u64,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}
