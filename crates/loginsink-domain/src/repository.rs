use crate::error::IngestResult;
use crate::record::LoginRecord;
use async_trait::async_trait;

/// Everything the dead-letter table needs about one failed attempt:
/// the stringified error, the serialized envelope, and whatever part of
/// the body parsed (None when the body itself was unparseable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailureInput {
    pub error_message: String,
    pub message: serde_json::Value,
    pub message_body: Option<serde_json::Value>,
}

/// Repository for the primary `user_logins` table.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LoginRecordRepository: Send + Sync {
    /// Append one normalized record. One statement, so the row commits
    /// atomically before the caller acknowledges the message. Constraint
    /// violations and connection loss surface as `InsertFailure`.
    async fn insert_login(&self, record: &LoginRecord) -> IngestResult<()>;
}

/// Repository for the append-only `error_records` dead-letter table.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeadLetterRepository: Send + Sync {
    /// Ensure the dead-letter table exists (idempotent), then append one
    /// row. Rows are never updated or deleted by this system.
    async fn record_failure(&self, input: RecordFailureInput) -> IngestResult<()>;
}
