use crate::client::PostgresClient;
use async_trait::async_trait;
use loginsink_domain::{IngestError, IngestResult, LoginRecord, LoginRecordRepository};
use tracing::{debug, instrument};

const INSERT_LOGIN: &str = "INSERT INTO user_logins \
    (user_id, device_type, masked_ip, masked_device_id, locale, app_version, create_date) \
    VALUES ($1, $2, $3, $4, $5, $6, $7)";

/// PostgreSQL implementation of the `user_logins` repository.
///
/// The insert is a single statement, so each record commits in its own
/// implicit transaction before the worker acknowledges the message.
#[derive(Clone)]
pub struct PostgresLoginRecordRepository {
    client: PostgresClient,
}

impl PostgresLoginRecordRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LoginRecordRepository for PostgresLoginRecordRepository {
    #[instrument(skip(self, record), fields(user_id = %record.user_id))]
    async fn insert_login(&self, record: &LoginRecord) -> IngestResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(IngestError::InsertFailure)?;

        conn.execute(
            INSERT_LOGIN,
            &[
                &record.user_id,
                &record.device_type,
                &record.masked_ip,
                &record.masked_device_id,
                &record.locale,
                &record.app_version,
                &record.create_date,
            ],
        )
        .await
        .map_err(|e| IngestError::InsertFailure(e.into()))?;

        debug!("login record inserted");
        Ok(())
    }
}
