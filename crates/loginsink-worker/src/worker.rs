use anyhow::Result;
use loginsink_domain::{LoginIngestService, MessageQueue, RawMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct IngestWorkerConfig {
    /// Messages requested per receive call in bounded-drain mode.
    /// Continuous mode always receives one message per cycle.
    pub drain_batch_size: i32,
    /// Sleep between empty polls in continuous mode.
    pub poll_interval: Duration,
    /// Cap for empty-poll backoff. When higher than `poll_interval`, the
    /// sleep doubles on each consecutive empty poll up to this cap and
    /// resets on the next non-empty receive. `None` keeps the interval
    /// fixed.
    pub max_poll_interval: Option<Duration>,
}

impl Default for IngestWorkerConfig {
    fn default() -> Self {
        Self {
            drain_batch_size: 10,
            poll_interval: Duration::from_secs(10),
            max_poll_interval: None,
        }
    }
}

/// Counts for one bounded-drain session. Every received message lands in
/// exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub persisted: u64,
    pub dead_lettered: u64,
}

/// Drives the consume → transform → persist → acknowledge cycle.
///
/// Messages are handled strictly one at a time; queue receive failures
/// abort the loop, while per-message failures are absorbed by the ingest
/// service's dead-letter path and only counted here.
pub struct IngestWorker {
    queue: Arc<dyn MessageQueue>,
    service: Arc<LoginIngestService>,
    config: IngestWorkerConfig,
}

impl IngestWorker {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        service: Arc<LoginIngestService>,
        config: IngestWorkerConfig,
    ) -> Self {
        Self {
            queue,
            service,
            config,
        }
    }

    /// Bounded-drain mode: process until the queue reports empty, then
    /// stop. Depth 0 on the first check is a clean no-op session.
    pub async fn drain(&self) -> Result<DrainSummary> {
        info!("starting bounded drain");
        let mut summary = DrainSummary::default();

        loop {
            let depth = self.queue.approximate_depth().await?;
            if depth == 0 {
                info!(
                    persisted = summary.persisted,
                    dead_lettered = summary.dead_lettered,
                    "queue empty, drain complete"
                );
                break;
            }
            debug!(depth, "queue reports pending messages");

            let messages = self.queue.receive(self.config.drain_batch_size).await?;
            if messages.is_empty() {
                // Depth counts in-flight deliveries that are not yet
                // visible again; back off instead of spinning on them.
                debug!(depth, "no visible messages, waiting before next depth check");
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }

            for message in &messages {
                if self.handle_message(message).await {
                    summary.persisted += 1;
                } else {
                    summary.dead_lettered += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Continuous mode: poll forever, sleeping between empty polls, until
    /// the cancellation token fires. Queue receive failures propagate.
    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!("starting continuous ingest loop");
        let mut interval = self.config.poll_interval;

        loop {
            let messages = tokio::select! {
                _ = ctx.cancelled() => break,
                result = self.queue.receive(1) => result?,
            };

            if messages.is_empty() {
                debug!(sleep = ?interval, "queue empty, waiting for new messages");
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                interval = next_interval(interval, self.config.max_poll_interval);
                continue;
            }
            interval = self.config.poll_interval;

            for message in &messages {
                self.handle_message(message).await;
            }
        }

        info!("continuous ingest loop stopped");
        Ok(())
    }

    /// Shared per-message handling: process, then acknowledge on success.
    /// Returns whether the message was persisted. A failed delete is
    /// logged and accepted; the message will be redelivered and the insert
    /// repeated, which at-least-once delivery permits.
    async fn handle_message(&self, message: &RawMessage) -> bool {
        match self.service.process(message).await {
            Ok(()) => {
                if let Err(e) = self.queue.delete(&message.receipt_handle).await {
                    warn!(error = %e, "failed to delete message, it will be redelivered");
                }
                true
            }
            Err(_) => false,
        }
    }
}

fn next_interval(current: Duration, max: Option<Duration>) -> Duration {
    match max {
        Some(max) => (current * 2).min(max),
        None => current,
    }
}
