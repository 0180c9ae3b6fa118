use serde::{Deserialize, Serialize};

/// One queue delivery, owned by the worker for a single processing attempt.
///
/// The receipt handle acknowledges (deletes) exactly this delivery; it is
/// only used after the record has been persisted. The whole envelope is
/// serialized into the dead-letter table when processing fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub message_id: Option<String>,
    pub receipt_handle: String,
    pub body: String,
}
