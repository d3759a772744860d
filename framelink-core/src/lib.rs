//! # Framelink Core
//!
//! Framed message exchange over raw byte transports such as USB-CDC serial links.
//!
//! ## Modules
//!
//! - `constants`: Defaults and wire limits
//! - `types`: Codec contract (`FrameCodec`, `Sliced`)
//! - `reassembler`: Incremental frame slicing over a growing buffer
//! - `stream`: The framed link (`FrameStream`): arming, receive queue, send path
//! - `exchange`: Bounded request/response exchanges and watchdog sinks
//! - `transport`: Transport trait plus stream and in-memory implementations
//! - `codec`: Reference line and length-prefixed codecs
//! - `config`: Link configuration

#![warn(missing_docs)]

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod exchange;
pub mod reassembler;
pub mod stream;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::LinkConfig;
pub use error::LinkError;
pub use exchange::{DeadlineSink, FnSink, ReceiveSink, Watchdog, WatchdogSink};
pub use reassembler::Reassembler;
pub use stream::{FrameStream, ReceivingGuard};
pub use transport::{ByteSink, Transport};
pub use types::{FrameCodec, Sliced};

/// Result type alias for Framelink operations
pub type Result<T> = core::result::Result<T, LinkError>;
