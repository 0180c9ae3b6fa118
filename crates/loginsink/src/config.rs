use config::{Config, ConfigError, Environment};
use loginsink_postgres::PostgresConfig;
use loginsink_sqs::SqsConfig;
use loginsink_worker::IngestWorkerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Empty the queue once, then exit.
    Drain,
    /// Poll until stopped by signal.
    Continuous,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Processing mode: "drain" or "continuous".
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Queue configuration
    /// SQS queue URL. Required.
    pub sqs_queue_url: String,

    /// AWS region hosting the queue.
    #[serde(default = "default_aws_region")]
    pub aws_region: String,

    /// Static AWS credentials. When absent the default credential chain
    /// applies.
    #[serde(default)]
    pub aws_access_key_id: Option<String>,

    #[serde(default)]
    pub aws_secret_access_key: Option<String>,

    /// Endpoint override for local SQS-compatible stacks.
    #[serde(default)]
    pub sqs_endpoint_url: Option<String>,

    // Database configuration
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_pool_size")]
    pub postgres_pool_size: usize,

    // Worker configuration
    /// Messages requested per receive call in drain mode.
    #[serde(default = "default_drain_batch_size")]
    pub drain_batch_size: i32,

    /// Sleep between empty polls in continuous mode, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Empty-poll backoff cap in seconds. Unset keeps the interval fixed.
    #[serde(default)]
    pub max_poll_interval_secs: Option<u64>,
}

fn default_mode() -> String {
    "drain".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "postgres".to_string()
}

fn default_postgres_username() -> String {
    "postgres".to_string()
}

fn default_postgres_password() -> String {
    "postgres".to_string()
}

fn default_postgres_pool_size() -> usize {
    4
}

fn default_drain_batch_size() -> i32 {
    10
}

fn default_poll_interval_secs() -> u64 {
    10
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("LOGINSINK"))
            .build()?
            .try_deserialize()
    }

    pub fn mode(&self) -> Result<ServiceMode, ConfigError> {
        match self.mode.as_str() {
            "drain" => Ok(ServiceMode::Drain),
            "continuous" => Ok(ServiceMode::Continuous),
            other => Err(ConfigError::Message(format!(
                "unknown mode '{other}', expected 'drain' or 'continuous'"
            ))),
        }
    }

    pub fn sqs(&self) -> SqsConfig {
        SqsConfig {
            queue_url: self.sqs_queue_url.clone(),
            region: self.aws_region.clone(),
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
            endpoint_url: self.sqs_endpoint_url.clone(),
        }
    }

    pub fn postgres(&self) -> PostgresConfig {
        PostgresConfig {
            host: self.postgres_host.clone(),
            port: self.postgres_port,
            database: self.postgres_database.clone(),
            username: self.postgres_username.clone(),
            password: self.postgres_password.clone(),
            max_pool_size: self.postgres_pool_size,
        }
    }

    pub fn worker(&self) -> IngestWorkerConfig {
        IngestWorkerConfig {
            drain_batch_size: self.drain_batch_size,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_poll_interval: self.max_poll_interval_secs.map(Duration::from_secs),
        }
    }
}
