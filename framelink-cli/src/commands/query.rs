use anyhow::{Context, Result};
use framelink_core::codec::LineCodec;
use framelink_core::transport::StreamTransport;
use framelink_core::{FrameStream, LinkConfig, Transport, Watchdog, WatchdogSink};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lines collected from a device in answer to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub lines: Vec<String>,
    /// Whether the terminator line was seen before the idle timeout
    pub completed: bool,
}

/// Send `command` as a line and collect response lines until `terminator` or `idle_timeout`
pub fn run_query<T>(
    transport: T,
    command: &str,
    terminator: &str,
    idle_timeout: Duration,
    config: &LinkConfig,
) -> Result<QueryOutcome>
where
    T: Transport + 'static,
{
    let stream = FrameStream::open_with_config(transport, LineCodec::new(), config)
        .context("Failed to open device")?;

    let mut lines = Vec::new();
    let result = stream
        .transact(
            &command.to_string(),
            WatchdogSink::new(idle_timeout, |line: String, watchdog: &mut Watchdog| {
                watchdog.reset();
                if line == terminator {
                    return Ok(Some(()));
                }
                debug!("Response line: {}", line);
                lines.push(line);
                Ok(None)
            }),
        )
        .with_context(|| format!("Query '{}' failed", command))?;

    stream.close();

    Ok(QueryOutcome {
        lines,
        completed: result.is_some(),
    })
}

pub fn execute(
    device: &str,
    command: &str,
    terminator: &str,
    idle_timeout_ms: u64,
    config: &LinkConfig,
) -> Result<()> {
    info!("Opening device: {} at {} baud", device, config.baud_rate);

    let transport = StreamTransport::open_serial(device, config.baud_rate)
        .with_context(|| format!("Failed to open device: {}", device))?
        .with_chunk_size(config.read_chunk_size);

    let outcome = run_query(
        transport,
        command,
        terminator,
        Duration::from_millis(idle_timeout_ms),
        config,
    )?;

    for line in &outcome.lines {
        println!("{}", line);
    }

    if !outcome.completed {
        warn!(
            "No '{}' line within {} ms of the last response",
            terminator, idle_timeout_ms
        );
    }

    Ok(())
}
