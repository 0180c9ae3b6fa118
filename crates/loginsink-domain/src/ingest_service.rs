use crate::error::{IngestError, IngestResult};
use crate::message::RawMessage;
use crate::normalizer::normalize;
use crate::repository::{DeadLetterRepository, LoginRecordRepository, RecordFailureInput};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Domain service for one processing attempt: normalize the body, insert
/// the record, and route any failure into the dead-letter table.
///
/// Every attempt ends in exactly one of {login row inserted, dead-letter
/// row written}; acknowledging the message afterwards is the caller's job.
pub struct LoginIngestService {
    login_repository: Arc<dyn LoginRecordRepository>,
    dead_letter_repository: Arc<dyn DeadLetterRepository>,
}

impl LoginIngestService {
    pub fn new(
        login_repository: Arc<dyn LoginRecordRepository>,
        dead_letter_repository: Arc<dyn DeadLetterRepository>,
    ) -> Self {
        Self {
            login_repository,
            dead_letter_repository,
        }
    }

    /// Process a single message. On success the login record is persisted
    /// and the caller may delete the message from the queue. On failure the
    /// raw envelope is captured in the dead-letter table and the original
    /// error is returned; the caller continues with the next message.
    #[instrument(skip(self, message), fields(message_id = message.message_id.as_deref().unwrap_or("")))]
    pub async fn process(&self, message: &RawMessage) -> IngestResult<()> {
        let outcome = match normalize(message.body.as_bytes()) {
            Ok(record) => self.login_repository.insert_login(&record).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                debug!("login record persisted");
                Ok(())
            }
            Err(original) => {
                warn!(error = %original, "processing failed, routing message to dead letter");
                self.record_failure(&original, message).await;
                Err(original)
            }
        }
    }

    /// Best-effort dead-letter write. A secondary failure here is logged
    /// and swallowed: the primary failure is already in the application
    /// logs, and crashing the loop would lose the rest of the batch.
    async fn record_failure(&self, original: &IngestError, message: &RawMessage) {
        let input = RecordFailureInput {
            error_message: original.to_string(),
            message: serde_json::to_value(message).unwrap_or(Value::Null),
            message_body: serde_json::from_str(&message.body).ok(),
        };

        if let Err(secondary) = self.dead_letter_repository.record_failure(input).await {
            error!(error = %secondary, "failed to write dead letter record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockDeadLetterRepository, MockLoginRecordRepository};
    use anyhow::anyhow;

    fn message_with_body(body: &str) -> RawMessage {
        RawMessage {
            message_id: Some("m-1".to_string()),
            receipt_handle: "rh-1".to_string(),
            body: body.to_string(),
        }
    }

    fn valid_body() -> String {
        serde_json::json!({
            "user_id": "u1",
            "device_type": "ios",
            "ip": "1.2.3.4",
            "device_id": "d1",
            "locale": "en-US",
            "app_version": "1.0"
        })
        .to_string()
    }

    fn service(
        logins: MockLoginRecordRepository,
        dead_letters: MockDeadLetterRepository,
    ) -> LoginIngestService {
        LoginIngestService::new(Arc::new(logins), Arc::new(dead_letters))
    }

    #[tokio::test]
    async fn persists_valid_message_without_dead_letter() {
        let mut logins = MockLoginRecordRepository::new();
        logins
            .expect_insert_login()
            .withf(|record| record.user_id == "u1" && record.device_type == "ios")
            .times(1)
            .returning(|_| Ok(()));
        let dead_letters = MockDeadLetterRepository::new();

        let result = service(logins, dead_letters)
            .process(&message_with_body(&valid_body()))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_field_goes_to_dead_letter_with_parsed_body() {
        let logins = MockLoginRecordRepository::new();
        let mut dead_letters = MockDeadLetterRepository::new();
        dead_letters
            .expect_record_failure()
            .withf(|input| {
                input.error_message.contains("locale")
                    && input.message_body.is_some()
                    && input.message["receipt_handle"] == "rh-1"
            })
            .times(1)
            .returning(|_| Ok(()));

        let body = serde_json::json!({
            "user_id": "u1",
            "device_type": "ios",
            "ip": "1.2.3.4",
            "device_id": "d1",
            "app_version": "1.0"
        })
        .to_string();

        let result = service(logins, dead_letters)
            .process(&message_with_body(&body))
            .await;

        match result {
            Err(IngestError::MissingField(field)) => assert_eq!(field, "locale"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_body_dead_letters_without_message_body() {
        let logins = MockLoginRecordRepository::new();
        let mut dead_letters = MockDeadLetterRepository::new();
        dead_letters
            .expect_record_failure()
            .withf(|input| input.message_body.is_none())
            .times(1)
            .returning(|_| Ok(()));

        let result = service(logins, dead_letters)
            .process(&message_with_body("definitely not json"))
            .await;

        assert!(matches!(result, Err(IngestError::MalformedPayload(_))));
    }

    #[tokio::test]
    async fn insert_failure_goes_to_dead_letter() {
        let mut logins = MockLoginRecordRepository::new();
        logins
            .expect_insert_login()
            .times(1)
            .returning(|_| Err(IngestError::InsertFailure(anyhow!("connection lost"))));
        let mut dead_letters = MockDeadLetterRepository::new();
        dead_letters
            .expect_record_failure()
            .withf(|input| {
                input.error_message.contains("connection lost") && input.message_body.is_some()
            })
            .times(1)
            .returning(|_| Ok(()));

        let result = service(logins, dead_letters)
            .process(&message_with_body(&valid_body()))
            .await;

        assert!(matches!(result, Err(IngestError::InsertFailure(_))));
    }

    #[tokio::test]
    async fn secondary_dead_letter_failure_is_swallowed() {
        let mut logins = MockLoginRecordRepository::new();
        logins
            .expect_insert_login()
            .times(1)
            .returning(|_| Err(IngestError::InsertFailure(anyhow!("boom"))));
        let mut dead_letters = MockDeadLetterRepository::new();
        dead_letters
            .expect_record_failure()
            .times(1)
            .returning(|_| Err(IngestError::DeadLetterWrite(anyhow!("db unavailable"))));

        // The original error comes back; the secondary one is only logged.
        let result = service(logins, dead_letters)
            .process(&message_with_body(&valid_body()))
            .await;

        assert!(matches!(result, Err(IngestError::InsertFailure(_))));
    }
}
