//! # Parse Session
//!
//! Runs a blocking LTM parse on tokio's blocking pool and races it against a
//! shutdown signal.
//!
//! The parser itself has no notion of cancellation. Instead the byte source
//! is wrapped in a [`CancellableReader`]: once cancelled, its next read fails,
//! and the parser returns everything it decoded up to that point.

use std::future::Future;
use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::error::{LtmError, ReadCancelled, Result};
use crate::ltm::{FrameSink, ParseResult, Parser};

/// Shared flag used to stop a running parse
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Pause between retries of a source that timed out or would block
const RETRY_BACKOFF: Duration = Duration::from_millis(5);

/// Reader wrapper that fails once its [`CancelHandle`] is cancelled
///
/// Read timeouts from the inner source are retried after a short pause until
/// cancellation, so a quiet serial link keeps the parse alive.
#[derive(Debug)]
pub struct CancellableReader<R> {
    inner: R,
    cancel: CancelHandle,
}

impl<R: Read> CancellableReader<R> {
    pub fn new(inner: R, cancel: CancelHandle) -> Self {
        Self { inner, cancel }
    }
}

impl<R: Read> Read for CancellableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(io::Error::new(ErrorKind::Other, ReadCancelled));
            }

            match self.inner.read(buf) {
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    thread::sleep(RETRY_BACKOFF);
                }
                other => return other,
            }
        }
    }
}

/// Outcome of a session: the parse result and the sink that received frames
#[derive(Debug)]
pub struct SessionReport<S> {
    pub result: ParseResult,
    pub sink: S,
    pub cancelled: bool,
}

/// Parse `reader` in the background until it ends or `shutdown` resolves
///
/// # Arguments
///
/// * `parser` - Configured parser
/// * `reader` - Blocking byte source
/// * `sink` - Receives each validated frame while the parse runs
/// * `shutdown` - Future that requests cancellation when it completes
///
/// # Errors
///
/// Returns `LtmError::Session` if the blocking task panics or is aborted.
/// Stream errors are reported in the returned `ParseResult`, not here.
pub async fn run_session<R, S, F>(
    parser: Parser,
    reader: R,
    sink: S,
    shutdown: F,
) -> Result<SessionReport<S>>
where
    R: Read + Send + 'static,
    S: FrameSink + Send + 'static,
    F: Future<Output = ()>,
{
    let cancel = CancelHandle::new();
    let reader = CancellableReader::new(reader, cancel.clone());

    let mut task = tokio::task::spawn_blocking(move || {
        let mut sink = sink;
        let result = parser.parse_with(reader, &mut sink);
        (result, sink)
    });

    let joined = tokio::select! {
        joined = &mut task => joined,
        _ = shutdown => {
            info!("Shutdown requested, stopping LTM parse");
            cancel.cancel();
            task.await
        }
    };

    let (result, sink) = joined.map_err(|e| LtmError::Session(e.to_string()))?;

    Ok(SessionReport {
        result,
        sink,
        cancelled: cancel.is_cancelled(),
    })
}
