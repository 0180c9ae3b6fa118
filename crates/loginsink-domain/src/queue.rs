use crate::error::IngestResult;
use crate::message::RawMessage;
use async_trait::async_trait;

/// Message queue contract, SQS-shaped: visibility-timeout at-least-once
/// delivery with an explicit delete to prevent redelivery.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Single non-blocking poll. Returns an empty vec when no messages are
    /// currently visible; waiting is the caller's concern.
    async fn receive(&self, max: i32) -> IngestResult<Vec<RawMessage>>;

    /// Remove a delivery from the queue. A failure here means the message
    /// will be redelivered after the visibility timeout; callers log and
    /// move on rather than retrying.
    async fn delete(&self, receipt_handle: &str) -> IngestResult<()>;

    /// Eventually-consistent queue depth estimate. Loop-termination
    /// heuristic only, never an exact count.
    async fn approximate_depth(&self) -> IngestResult<usize>;
}
