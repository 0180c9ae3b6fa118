use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("insert failed: {0}")]
    InsertFailure(anyhow::Error),

    #[error("queue receive failed: {0}")]
    QueueReceive(anyhow::Error),

    #[error("queue delete failed: {0}")]
    QueueDelete(anyhow::Error),

    #[error("dead letter write failed: {0}")]
    DeadLetterWrite(anyhow::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;
