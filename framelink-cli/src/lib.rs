//! Library entry for framelink-cli used by integration tests and embedding.

pub mod commands;

// Re-export commands for convenience
pub use commands::*;

use anyhow::{Context, Result};
use framelink_core::LinkConfig;
use std::fs;

/// Device framing selectable from the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CodecKind {
    /// Newline-terminated text lines
    Line,
    /// u16 length-prefixed binary packets
    Length,
}

/// Load link settings from a JSON file, or use the defaults
pub fn load_config(path: Option<&str>) -> Result<LinkConfig> {
    let Some(path) = path else {
        return Ok(LinkConfig::default());
    };

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path))
}
