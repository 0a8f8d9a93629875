//! Batch streaming: fan a validated batch out to the orchestrator under
//! bounded concurrency and emit typed events in completion order.
//!
//! The stream contract (see [`crate::types::LookupEvent`]):
//! 1. one `total` event carrying the deduplicated domain count, first;
//! 2. a `message` event announcing the lookup start;
//! 3. exactly one `result` event per domain, in completion order;
//! 4. `keep_alive` events whenever no result completes within the
//!    configured idle interval.
//!
//! Dropping the returned stream cancels the batch: the driver task notices
//! the closed channel on its next send, stops dispatching, and in-flight
//! lookups are dropped with it. A cancelled batch is not an error.

use crate::error::LookupError;
use crate::lookup::LookupOrchestrator;
use crate::types::{DomainResult, LookupConfig, LookupEvent, LookupRequest};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// The outbound event sequence handed to the transport boundary.
pub type EventStream = Pin<Box<dyn Stream<Item = LookupEvent> + Send>>;

/// Streams batches of domain lookups as typed events.
#[derive(Clone)]
pub struct BatchStreamer {
    orchestrator: LookupOrchestrator,
}

impl BatchStreamer {
    /// Create a streamer with its own orchestrator and bootstrap registry.
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        Ok(Self {
            orchestrator: LookupOrchestrator::new(config)?,
        })
    }

    /// Create a streamer over an existing orchestrator (injection seam
    /// for tests and for callers sharing one bootstrap registry).
    pub fn with_orchestrator(orchestrator: LookupOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Launch a validated batch and return its event stream.
    ///
    /// The lookups run on a spawned driver task, so the stream yields
    /// events as they happen regardless of how fast the consumer polls.
    pub fn stream(&self, request: LookupRequest) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = self.orchestrator.clone();

        tokio::spawn(drive_batch(orchestrator, request, tx));

        Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        }))
    }
}

/// Run the batch to completion, sending events into the channel.
///
/// Returns early (cancelling remaining work) as soon as a send fails,
/// which means the consumer dropped the stream.
async fn drive_batch(
    orchestrator: LookupOrchestrator,
    request: LookupRequest,
    tx: mpsc::UnboundedSender<LookupEvent>,
) {
    let total = request.domains.len();
    let concurrency = orchestrator.config().concurrency;
    let keepalive = orchestrator.config().keepalive_interval;

    debug!(total, concurrency, use_rdap = request.use_rdap, "starting batch");

    if tx.send(LookupEvent::Total { total }).is_err() {
        return;
    }
    if tx
        .send(LookupEvent::Message {
            message: "Lookup started".to_string(),
        })
        .is_err()
    {
        return;
    }

    let fields = request.fields;
    let use_rdap = request.use_rdap;

    let lookups = futures::stream::iter(request.domains.into_iter().map(|domain| {
        let orchestrator = orchestrator.clone();
        let fields = fields.clone();
        async move { orchestrator.lookup_domain(&domain, use_rdap, &fields).await }
    }))
    .buffer_unordered(concurrency);

    futures::pin_mut!(lookups);

    if pump_results(&mut lookups, &tx, keepalive).await {
        debug!(total, "batch complete");
    } else {
        debug!("consumer dropped the stream, batch cancelled");
    }
}

/// Forward completed lookups into the channel, interleaving keep-alive
/// events whenever no result lands within `keepalive`.
///
/// Returns `false` if the consumer went away before the batch finished.
async fn pump_results<S>(
    results: &mut S,
    tx: &mpsc::UnboundedSender<LookupEvent>,
    keepalive: Duration,
) -> bool
where
    S: Stream<Item = DomainResult> + Unpin,
{
    loop {
        tokio::select! {
            next = results.next() => match next {
                Some(result) => {
                    if tx.send(LookupEvent::Result(result)).is_err() {
                        return false;
                    }
                }
                None => return true,
            },
            // The sleep is recreated every iteration, so it measures idle
            // time since the last event rather than wall-clock time.
            _ = tokio::time::sleep(keepalive) => {
                if tx.send(LookupEvent::KeepAlive).is_err() {
                    return false;
                }
            }
        }
    }
}
