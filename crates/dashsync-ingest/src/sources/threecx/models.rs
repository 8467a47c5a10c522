//! 3CX API payloads and their destination rows
//!
//! Raw types mirror the camelCase JSON returned by the 3CX REST API and keep
//! unknown fields in `extra`, which is persisted as `raw_payload`. Row types
//! mirror the `3cx_*` table columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Accept identifiers sent either as strings or as numbers
fn id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn raw_payload(extra: Map<String, Value>) -> Option<Value> {
    if extra.is_empty() {
        None
    } else {
        Some(Value::Object(extra))
    }
}

// ============================================================================
// Call records
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCallRecord {
    #[serde(default, deserialize_with = "id_string")]
    pub call_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub from_number: Option<String>,
    #[serde(default)]
    pub to_number: Option<String>,
    #[serde(default, deserialize_with = "id_string")]
    pub extension: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Row of `3cx_call_records`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecordRow {
    pub call_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub direction: Option<String>,
    pub caller_number: Option<String>,
    pub callee_number: Option<String>,
    pub extension_number: Option<String>,
    pub status: Option<String>,
    pub recording_url: Option<String>,
    pub raw_payload: Option<Value>,
}

impl From<RawCallRecord> for CallRecordRow {
    fn from(raw: RawCallRecord) -> Self {
        // Derive the duration when the PBX only reports start/end
        let duration_seconds = raw.duration.or_else(|| match (raw.start_time, raw.end_time) {
            (Some(start), Some(end)) if end >= start => Some((end - start).num_seconds()),
            _ => None,
        });

        Self {
            call_id: raw.call_id,
            started_at: raw.start_time,
            ended_at: raw.end_time,
            duration_seconds,
            direction: raw.direction.map(|d| d.to_lowercase()),
            caller_number: raw.from_number,
            callee_number: raw.to_number,
            extension_number: raw.extension,
            status: raw.status.map(|s| s.to_lowercase()),
            recording_url: raw.recording_url,
            raw_payload: raw_payload(raw.extra),
        }
    }
}

// ============================================================================
// Contacts
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContact {
    #[serde(default, deserialize_with = "id_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Row of `3cx_contacts`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactRow {
    pub contact_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub raw_payload: Option<Value>,
}

fn display_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

impl From<RawContact> for ContactRow {
    fn from(raw: RawContact) -> Self {
        Self {
            display_name: display_name(raw.first_name.as_deref(), raw.last_name.as_deref()),
            contact_id: raw.id,
            first_name: raw.first_name,
            last_name: raw.last_name,
            company: raw.company_name,
            email: raw.email.map(|e| e.trim().to_lowercase()),
            phone: raw.phone_number,
            mobile: raw.mobile_number,
            raw_payload: raw_payload(raw.extra),
        }
    }
}

// ============================================================================
// Extensions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtension {
    #[serde(default, deserialize_with = "id_string")]
    pub number: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_registered: Option<bool>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Row of `3cx_extensions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionRow {
    pub extension_number: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub is_registered: bool,
    pub department: Option<String>,
    pub raw_payload: Option<Value>,
}

impl From<RawExtension> for ExtensionRow {
    fn from(raw: RawExtension) -> Self {
        Self {
            display_name: display_name(raw.first_name.as_deref(), raw.last_name.as_deref()),
            extension_number: raw.number,
            email: raw.email.map(|e| e.trim().to_lowercase()),
            is_registered: raw.is_registered.unwrap_or(false),
            department: raw.department,
            raw_payload: raw_payload(raw.extra),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_record_mapping() {
        let raw: RawCallRecord = serde_json::from_value(json!({
            "callId": 98765,
            "startTime": "2026-03-01T10:00:00Z",
            "endTime": "2026-03-01T10:02:30Z",
            "direction": "Inbound",
            "fromNumber": "+5511999990000",
            "toNumber": "200",
            "extension": 200,
            "status": "Answered",
            "queue": "sales"
        }))
        .unwrap();

        let row = CallRecordRow::from(raw);
        assert_eq!(row.call_id.as_deref(), Some("98765"));
        assert_eq!(row.duration_seconds, Some(150));
        assert_eq!(row.direction.as_deref(), Some("inbound"));
        assert_eq!(row.extension_number.as_deref(), Some("200"));
        assert_eq!(row.status.as_deref(), Some("answered"));
        assert_eq!(row.raw_payload, Some(json!({ "queue": "sales" })));
    }

    #[test]
    fn test_explicit_duration_wins() {
        let raw: RawCallRecord = serde_json::from_value(json!({
            "callId": "A1",
            "startTime": "2026-03-01T10:00:00Z",
            "endTime": "2026-03-01T10:02:30Z",
            "duration": 120
        }))
        .unwrap();
        assert_eq!(CallRecordRow::from(raw).duration_seconds, Some(120));
    }

    #[test]
    fn test_missing_call_id_is_kept_as_none() {
        let raw: RawCallRecord = serde_json::from_value(json!({ "status": "missed" })).unwrap();
        let row = CallRecordRow::from(raw);
        assert!(row.call_id.is_none());
        assert!(row.raw_payload.is_none());
    }

    #[test]
    fn test_contact_mapping() {
        let raw: RawContact = serde_json::from_value(json!({
            "id": "c-1",
            "firstName": "Ana",
            "lastName": " Souza ",
            "email": " Ana@Example.COM ",
            "phoneNumber": "+551130000000"
        }))
        .unwrap();

        let row = ContactRow::from(raw);
        assert_eq!(row.contact_id.as_deref(), Some("c-1"));
        assert_eq!(row.display_name.as_deref(), Some("Ana Souza"));
        assert_eq!(row.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_extension_mapping() {
        let raw: RawExtension =
            serde_json::from_value(json!({ "number": "101", "firstName": "Reception" })).unwrap();
        let row = ExtensionRow::from(raw);
        assert_eq!(row.extension_number.as_deref(), Some("101"));
        assert_eq!(row.display_name.as_deref(), Some("Reception"));
        assert!(!row.is_registered);
    }
}
