use serde::{Deserialize, Serialize};

/// SQS connection parameters, filled from the service environment.
///
/// When the static credentials are absent the default AWS credential chain
/// applies (env vars, profile, instance metadata). `endpoint_url` points
/// the client at a local stack for development and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqsConfig {
    pub queue_url: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint_url: Option<String>,
}
