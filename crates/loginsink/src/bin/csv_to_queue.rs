//! One-shot batch loader: reads a CSV of login events and enqueues each
//! row as a JSON message for the consumer to pick up.

use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment};
use loginsink_domain::LoginEvent;
use loginsink_sqs::{SqsConfig, SqsQueueClient};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Deserialize)]
struct LoaderConfig {
    sqs_queue_url: String,
    #[serde(default = "default_aws_region")]
    aws_region: String,
    #[serde(default)]
    aws_access_key_id: Option<String>,
    #[serde(default)]
    aws_secret_access_key: Option<String>,
    #[serde(default)]
    sqs_endpoint_url: Option<String>,
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

impl LoaderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("LOGINSINK"))
            .build()?
            .try_deserialize()
    }

    fn sqs(&self) -> SqsConfig {
        SqsConfig {
            queue_url: self.sqs_queue_url.clone(),
            region: self.aws_region.clone(),
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
            endpoint_url: self.sqs_endpoint_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: csv-to-queue <events.csv>");
        std::process::exit(2);
    };

    match load(&path).await {
        Ok(count) => info!(count, "csv load complete"),
        Err(e) => {
            tracing::error!("csv load failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn load(path: &str) -> Result<u64> {
    let config = LoaderConfig::from_env().context("failed to load configuration")?;
    let queue = SqsQueueClient::connect(&config.sqs())
        .await
        .context("failed to create sqs client")?;

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open csv file {path}"))?;

    let mut count = 0u64;
    for row in reader.deserialize::<LoginEvent>() {
        let event = row.context("failed to parse csv row")?;
        let body = serde_json::to_string(&event).context("failed to serialize event")?;
        let message_id = queue.send(&body).await?;
        info!(message_id = %message_id, user_id = %event.user_id, "event enqueued");
        count += 1;
    }

    Ok(count)
}
