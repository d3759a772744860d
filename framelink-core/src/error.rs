//! Error types for Framelink operations

/// Errors that can occur while running a framed serial link
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    /// The underlying transport could not be opened
    #[error("Failed to open transport: {0}")]
    TransportOpen(String),

    /// Writing to the underlying transport failed
    #[error("Transport write failed: {0}")]
    TransportWrite(String),

    /// The codec produced no bytes for an outgoing frame
    #[error("Failed to format outgoing frame")]
    Format,

    /// `receive` was called while the link was not armed
    #[error("Not receiving: arm the link before calling receive")]
    NotReceiving,

    /// The transport has already been closed
    #[error("Transport is closed")]
    Closed,

    /// A received frame carried content the consumer could not accept
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

impl LinkError {
    /// Build an [`LinkError::InvalidFrame`] from anything printable
    pub fn invalid_frame(reason: impl core::fmt::Display) -> Self {
        LinkError::InvalidFrame(reason.to_string())
    }
}
