use serde::{Deserialize, Serialize};

/// Inbound login event payload as produced onto the queue.
///
/// The normalizer does not deserialize into this type (it reads fields by
/// name so the first missing field can be blamed); this is the shape the
/// CSV loader serializes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub user_id: String,
    pub device_type: String,
    pub ip: String,
    pub device_id: String,
    pub locale: String,
    pub app_version: String,
}
