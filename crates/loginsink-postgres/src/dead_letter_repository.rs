use crate::client::PostgresClient;
use async_trait::async_trait;
use loginsink_domain::{DeadLetterRepository, IngestError, IngestResult, RecordFailureInput};
use tracing::{debug, instrument};

const CREATE_ERROR_TABLE: &str = "CREATE TABLE IF NOT EXISTS error_records (
    error_id serial PRIMARY KEY,
    error_message text,
    message jsonb,
    message_body jsonb
)";

const INSERT_ERROR: &str =
    "INSERT INTO error_records (error_message, message, message_body) VALUES ($1, $2, $3)";

/// PostgreSQL implementation of the dead-letter repository.
///
/// Creates `error_records` on first use so the failure path never depends
/// on provisioning. Rows are append-only.
#[derive(Clone)]
pub struct PostgresDeadLetterRepository {
    client: PostgresClient,
}

impl PostgresDeadLetterRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeadLetterRepository for PostgresDeadLetterRepository {
    #[instrument(skip(self, input))]
    async fn record_failure(&self, input: RecordFailureInput) -> IngestResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(IngestError::DeadLetterWrite)?;

        conn.execute(CREATE_ERROR_TABLE, &[])
            .await
            .map_err(|e| IngestError::DeadLetterWrite(e.into()))?;

        conn.execute(
            INSERT_ERROR,
            &[&input.error_message, &input.message, &input.message_body],
        )
        .await
        .map_err(|e| IngestError::DeadLetterWrite(e.into()))?;

        debug!(error_message = %input.error_message, "dead letter record written");
        Ok(())
    }
}
