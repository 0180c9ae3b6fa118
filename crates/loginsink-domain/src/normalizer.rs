use crate::error::{IngestError, IngestResult};
use crate::masking::mask;
use crate::record::LoginRecord;
use chrono::Utc;
use serde_json::{Map, Value};

/// `device_type` values longer than this are silently cut to the first
/// 32 characters. Bounded-field policy, not an error.
pub const DEVICE_TYPE_MAX_CHARS: usize = 32;

/// Required payload fields, in blame order: when several are absent, the
/// first one in this list is the one reported.
const REQUIRED_FIELDS: [&str; 6] = [
    "user_id",
    "device_type",
    "ip",
    "device_id",
    "locale",
    "app_version",
];

/// Map a raw queue body into a normalized login record.
///
/// Parses the body as a JSON object, reads the six required string fields
/// in blame order, masks `ip` and `device_id`, truncates `device_type`,
/// and stamps `create_date` with the current processing time. Pure aside
/// from the clock read.
pub fn normalize(body: &[u8]) -> IngestResult<LoginRecord> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| IngestError::MalformedPayload(e.to_string()))?;
    let object = payload
        .as_object()
        .ok_or_else(|| IngestError::MalformedPayload("payload is not a JSON object".to_string()))?;

    let [user_id, device_type, ip, device_id, locale, app_version] = read_required_fields(object)?;

    Ok(LoginRecord {
        user_id: user_id.to_string(),
        device_type: truncate_chars(device_type, DEVICE_TYPE_MAX_CHARS),
        masked_ip: mask(ip),
        masked_device_id: mask(device_id),
        locale: locale.to_string(),
        app_version: app_version.to_string(),
        create_date: Utc::now(),
    })
}

/// Read the required fields in blame order, failing fast on the first
/// absent one. A present-but-non-string value counts as missing.
fn read_required_fields<'a>(object: &'a Map<String, Value>) -> IngestResult<[&'a str; 6]> {
    let mut values = [""; 6];
    for (slot, name) in values.iter_mut().zip(REQUIRED_FIELDS) {
        *slot = object
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| IngestError::MissingField(name.to_string()))?;
    }
    Ok(values)
}

fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}
