//! Bounded request/response exchanges on top of [`FrameStream::receive`]
//!
//! An exchange repeatedly pulls frames in short quanta and hands them to a
//! [`ReceiveSink`]. It ends as soon as the sink produces a result, or with
//! `None` once the sink's `wants_more` turns false. A sink error aborts the
//! exchange and is returned unchanged.
//!
//! Two timing policies share one state machine:
//! - [`DeadlineSink`]: a fixed budget measured from the start of the exchange
//! - [`WatchdogSink`]: an idle timeout the handler pushes back on progress

use crate::constants::MIN_POLL_QUANTUM;
use crate::stream::FrameStream;
use crate::types::FrameCodec;
use crate::Result;
use core::marker::PhantomData;
use core::time::Duration;
use std::time::Instant;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Consumer side of an exchange
pub trait ReceiveSink<T> {
    /// Final result of the exchange
    type Output;

    /// Handle one frame; `Some` ends the exchange with that result
    fn on_received(&mut self, frame: T) -> Result<Option<Self::Output>>;

    /// Whether the exchange should keep waiting for frames
    fn wants_more(&self) -> bool {
        true
    }
}

impl<T, S: ReceiveSink<T> + ?Sized> ReceiveSink<T> for &mut S {
    type Output = S::Output;

    fn on_received(&mut self, frame: T) -> Result<Option<S::Output>> {
        (**self).on_received(frame)
    }

    fn wants_more(&self) -> bool {
        (**self).wants_more()
    }
}

/// Deadline that can be pushed back
#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    timeout: Duration,
    last_reset: Instant,
}

impl Watchdog {
    /// Start a watchdog expiring `timeout` from now
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_reset: Instant::now(),
        }
    }

    /// Restart the timeout from now
    pub fn reset(&mut self) {
        self.last_reset = Instant::now();
    }

    /// Whether `timeout` has elapsed since the last reset
    pub fn expired(&self) -> bool {
        self.last_reset.elapsed() >= self.timeout
    }

    /// Time left before expiry
    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.last_reset.elapsed())
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Sink built from a closure; keeps waiting until the closure yields a result
pub struct FnSink<T, F> {
    handler: F,
    _frame: PhantomData<fn(T)>,
}

impl<T, O, F> FnSink<T, F>
where
    F: FnMut(T) -> Result<Option<O>>,
{
    /// Wrap `handler`
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _frame: PhantomData,
        }
    }
}

impl<T, O, F> ReceiveSink<T> for FnSink<T, F>
where
    F: FnMut(T) -> Result<Option<O>>,
{
    type Output = O;

    fn on_received(&mut self, frame: T) -> Result<Option<O>> {
        (self.handler)(frame)
    }
}

/// Sink that gives up a fixed time after it was created
pub struct DeadlineSink<T, F> {
    deadline: Watchdog,
    handler: F,
    _frame: PhantomData<fn(T)>,
}

impl<T, O, F> DeadlineSink<T, F>
where
    F: FnMut(T) -> Result<Option<O>>,
{
    /// Wrap `handler` with a `timeout` budget starting now
    pub fn new(timeout: Duration, handler: F) -> Self {
        Self {
            deadline: Watchdog::new(timeout),
            handler,
            _frame: PhantomData,
        }
    }
}

impl<T, O, F> ReceiveSink<T> for DeadlineSink<T, F>
where
    F: FnMut(T) -> Result<Option<O>>,
{
    type Output = O;

    fn on_received(&mut self, frame: T) -> Result<Option<O>> {
        (self.handler)(frame)
    }

    fn wants_more(&self) -> bool {
        !self.deadline.expired()
    }
}

/// Sink that gives up after `timeout` without progress
///
/// The handler gets the watchdog alongside each frame and calls
/// [`Watchdog::reset`] whenever the frame moved the exchange forward.
pub struct WatchdogSink<T, F> {
    watchdog: Watchdog,
    handler: F,
    _frame: PhantomData<fn(T)>,
}

impl<T, O, F> WatchdogSink<T, F>
where
    F: FnMut(T, &mut Watchdog) -> Result<Option<O>>,
{
    /// Wrap `handler` with an idle `timeout`, armed from now
    pub fn new(timeout: Duration, handler: F) -> Self {
        Self {
            watchdog: Watchdog::new(timeout),
            handler,
            _frame: PhantomData,
        }
    }

    /// The sink's watchdog
    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }
}

impl<T, O, F> ReceiveSink<T> for WatchdogSink<T, F>
where
    F: FnMut(T, &mut Watchdog) -> Result<Option<O>>,
{
    type Output = O;

    fn on_received(&mut self, frame: T) -> Result<Option<O>> {
        (self.handler)(frame, &mut self.watchdog)
    }

    fn wants_more(&self) -> bool {
        !self.watchdog.expired()
    }
}

impl<C: FrameCodec> FrameStream<C> {
    /// Run an exchange with the configured poll quantum
    ///
    /// The link must be armed.
    pub fn exchange<S>(&self, sink: S) -> Result<Option<S::Output>>
    where
        S: ReceiveSink<C::Frame>,
    {
        self.exchange_with_quantum(sink, self.poll_quantum())
    }

    /// Run an exchange, waiting at most `quantum` per receive
    ///
    /// `quantum` bounds how late the exchange notices that `wants_more` has
    /// turned false. It is raised to [`MIN_POLL_QUANTUM`] if shorter.
    pub fn exchange_with_quantum<S>(&self, mut sink: S, quantum: Duration) -> Result<Option<S::Output>>
    where
        S: ReceiveSink<C::Frame>,
    {
        let quantum = quantum.max(MIN_POLL_QUANTUM);
        while sink.wants_more() {
            let Some(frame) = self.receive(quantum)? else {
                continue;
            };

            #[cfg(feature = "logging")]
            trace!("Exchange received a frame");

            if let Some(result) = sink.on_received(frame)? {
                return Ok(Some(result));
            }
        }

        #[cfg(feature = "logging")]
        debug!("Exchange ended without a result");

        Ok(None)
    }

    /// Arm, send `request`, run an exchange, then disarm
    pub fn transact<S>(&self, request: &C::Frame, sink: S) -> Result<Option<S::Output>>
    where
        S: ReceiveSink<C::Frame>,
    {
        let armed = self.arm();
        armed.send(request)?;
        armed.exchange(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LineCodec;
    use crate::error::LinkError;
    use crate::transport::{MockPeer, MockTransport};

    const QUANTUM: Duration = Duration::from_millis(20);

    fn open_line_stream() -> (FrameStream<LineCodec>, MockPeer) {
        let (transport, peer) = MockTransport::new();
        let stream = FrameStream::open(transport, LineCodec::new()).unwrap();
        (stream, peer)
    }

    #[test]
    fn test_watchdog_reset() {
        let mut watchdog = Watchdog::new(Duration::from_millis(30));
        assert!(!watchdog.expired());

        std::thread::sleep(Duration::from_millis(40));
        assert!(watchdog.expired());
        assert_eq!(watchdog.remaining(), Duration::ZERO);

        watchdog.reset();
        assert!(!watchdog.expired());
        assert!(watchdog.remaining() > Duration::ZERO);
    }

    #[test]
    fn test_exchange_returns_first_result() {
        let (stream, peer) = open_line_stream();
        stream.set_receiving(true);
        peer.deliver(b"noise\nVALUE=7\nVALUE=8\n");

        let result = stream
            .exchange_with_quantum(
                FnSink::new(|line: String| {
                    Ok(line.strip_prefix("VALUE=").map(str::to_string))
                }),
                QUANTUM,
            )
            .unwrap();

        assert_eq!(result.as_deref(), Some("7"));
        assert_eq!(
            stream.receive(QUANTUM).unwrap(),
            Some("VALUE=8".to_string())
        );
    }

    #[test]
    fn test_exchange_requires_arming() {
        let (stream, _peer) = open_line_stream();

        let result = stream.exchange(FnSink::new(|_: String| Ok(Some(()))));

        assert_eq!(result, Err(LinkError::NotReceiving));
    }

    #[test]
    fn test_handler_error_aborts() {
        let (stream, peer) = open_line_stream();
        stream.set_receiving(true);
        peer.deliver(b"ERR 5\nOK\n");

        let mut seen = Vec::new();
        let result = stream.exchange_with_quantum(
            FnSink::new(|line: String| {
                seen.push(line.clone());
                match line.as_str() {
                    "OK" => Ok(Some(())),
                    other => Err(LinkError::invalid_frame(other)),
                }
            }),
            QUANTUM,
        );

        assert_eq!(result, Err(LinkError::InvalidFrame("ERR 5".into())));
        assert_eq!(seen, vec!["ERR 5".to_string()]);
    }

    #[test]
    fn test_deadline_expires_without_result() {
        let (stream, _peer) = open_line_stream();
        stream.set_receiving(true);

        let started = Instant::now();
        let result = stream
            .exchange_with_quantum(
                DeadlineSink::new(Duration::from_millis(100), |_: String| Ok(Some(()))),
                QUANTUM,
            )
            .unwrap();

        let elapsed = started.elapsed();
        assert_eq!(result, None);
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(100) + QUANTUM * 10);
    }

    #[test]
    fn test_watchdog_sink_accumulates() {
        let (stream, peer) = open_line_stream();
        peer.set_responder(|_| {
            vec![b"line 1\nli".to_vec(), b"ne 2\n".to_vec(), b"END\n".to_vec()]
        });

        let mut lines = Vec::new();
        let result = stream
            .transact(
                &"DUMP".to_string(),
                WatchdogSink::new(Duration::from_millis(500), |line: String, watchdog: &mut Watchdog| {
                    if line == "END" {
                        return Ok(Some(lines.len()));
                    }
                    lines.push(line);
                    watchdog.reset();
                    Ok(None)
                }),
            )
            .unwrap();

        assert_eq!(result, Some(2));
        assert_eq!(lines, vec!["line 1".to_string(), "line 2".to_string()]);
        assert!(!stream.is_receiving());
    }

    #[test]
    fn test_zero_quantum_does_not_spin() {
        struct Polls {
            started: Instant,
            polls: std::cell::Cell<usize>,
        }

        impl ReceiveSink<String> for Polls {
            type Output = ();

            fn on_received(&mut self, _frame: String) -> Result<Option<()>> {
                Ok(None)
            }

            fn wants_more(&self) -> bool {
                self.polls.set(self.polls.get() + 1);
                self.started.elapsed() < Duration::from_millis(50)
            }
        }

        let (stream, _peer) = open_line_stream();
        stream.set_receiving(true);

        let mut sink = Polls {
            started: Instant::now(),
            polls: Default::default(),
        };
        let result = stream.exchange_with_quantum(&mut sink, Duration::ZERO).unwrap();

        assert_eq!(result, None);
        let polls = sink.polls.get();
        assert!(polls <= 60, "{} polls in 50 ms", polls);
    }

    #[test]
    fn test_sink_by_reference_keeps_state() {
        struct Counter {
            frames: usize,
        }

        impl ReceiveSink<String> for Counter {
            type Output = ();

            fn on_received(&mut self, _frame: String) -> Result<Option<()>> {
                self.frames += 1;
                Ok((self.frames == 3).then_some(()))
            }
        }

        let (stream, peer) = open_line_stream();
        stream.set_receiving(true);
        peer.deliver(b"a\nb\nc\nd\n");

        let mut counter = Counter { frames: 0 };
        let result = stream.exchange_with_quantum(&mut counter, QUANTUM).unwrap();

        assert_eq!(result, Some(()));
        assert_eq!(counter.frames, 3);
    }
}
