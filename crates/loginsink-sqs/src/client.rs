use crate::config::SqsConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_sqs::config::{Credentials, Region};
use aws_sdk_sqs::types::QueueAttributeName;
use loginsink_domain::{IngestError, IngestResult, MessageQueue, RawMessage};
use tracing::{debug, info, warn};

/// SQS implementation of the message queue contract.
///
/// Short-polls only; waiting between empty polls belongs to the worker
/// loop. Deliveries missing a body or receipt handle are skipped with a
/// warning rather than surfaced as half-built messages.
pub struct SqsQueueClient {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueueClient {
    pub async fn connect(config: &SqsConfig) -> Result<Self> {
        if config.queue_url.is_empty() {
            return Err(anyhow!("queue URL must not be empty"));
        }

        info!(queue_url = %config.queue_url, region = %config.region, "connecting to SQS");

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        // Explicit credentials take precedence over the default chain.
        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key.clone(),
                secret.clone(),
                None,
                None,
                "loginsink",
            ));
        }

        let shared_config = loader.load().await;
        let mut builder = aws_sdk_sqs::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self {
            client: aws_sdk_sqs::Client::from_conf(builder.build()),
            queue_url: config.queue_url.clone(),
        })
    }

    /// Enqueue one message body, returning the queue-assigned message id.
    /// Producer-side helper for the CSV loader; the consumer loop never
    /// sends.
    pub async fn send(&self, body: &str) -> Result<String> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .context("sqs SendMessage failed")?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl MessageQueue for SqsQueueClient {
    async fn receive(&self, max: i32) -> IngestResult<Vec<RawMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max)
            .send()
            .await
            .context("sqs ReceiveMessage failed")
            .map_err(IngestError::QueueReceive)?;

        let mut messages = Vec::new();
        for message in output.messages() {
            match (message.body(), message.receipt_handle()) {
                (Some(body), Some(receipt_handle)) => messages.push(RawMessage {
                    message_id: message.message_id().map(str::to_string),
                    receipt_handle: receipt_handle.to_string(),
                    body: body.to_string(),
                }),
                _ => warn!(
                    message_id = message.message_id().unwrap_or(""),
                    "skipping delivery without body or receipt handle"
                ),
            }
        }

        debug!(count = messages.len(), "received queue messages");
        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> IngestResult<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .context("sqs DeleteMessage failed")
            .map_err(IngestError::QueueDelete)?;

        debug!("message deleted from queue");
        Ok(())
    }

    async fn approximate_depth(&self) -> IngestResult<usize> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .context("sqs GetQueueAttributes failed")
            .map_err(IngestError::QueueReceive)?;

        let depth = output
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);

        Ok(depth)
    }
}

// The client is a thin SDK wrapper; its behavior against a real queue is
// covered by integration testing with a local SQS-compatible endpoint.
