use chrono::{DateTime, Utc};

/// Normalized login record, ready for insertion into `user_logins`.
///
/// `masked_ip` and `masked_device_id` hold hex SHA-256 digests of the raw
/// values; the raw values never leave the normalizer. `create_date` is the
/// processing time, not the event time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRecord {
    pub user_id: String,
    pub device_type: String,
    pub masked_ip: String,
    pub masked_device_id: String,
    pub locale: String,
    pub app_version: String,
    pub create_date: DateTime<Utc>,
}
