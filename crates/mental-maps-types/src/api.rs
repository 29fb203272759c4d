use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::{ReportStatus, Visibility};

// -- Requests --
//
// Body fields are kept as raw JSON so that type mismatches surface as field
// issues in the validation envelope rather than as deserialization failures.
// Fields whose default applies only when the key is missing use `present`, so
// an explicit `null` arrives as `Some(Value::Null)`.

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateMapRequest {
    pub title: Option<Value>,
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub visibility: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateElementRequest {
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub x: Option<Value>,
    pub y: Option<Value>,
    pub content: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub style: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub map_id: Option<Value>,
    pub reason: Option<Value>,
    pub comment: Option<Value>,
}

/// Query string of `GET /maps`. Numbers stay strings; the pagination helper
/// decides what to do with garbage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListMapsQuery {
    pub visibility: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl ListMapsQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            visibility: single_value(pairs, "visibility"),
            limit: single_value(pairs, "limit"),
            cursor: single_value(pairs, "cursor"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListReportsQuery {
    pub status: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl ListReportsQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            status: single_value(pairs, "status"),
            limit: single_value(pairs, "limit"),
            cursor: single_value(pairs, "cursor"),
        }
    }
}

/// The value of `key` when it appears exactly once. A repeated key is not a
/// single string and counts as absent.
fn single_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    let mut values = pairs.iter().filter(|(k, _)| k == key).map(|(_, v)| v);
    match (values.next(), values.next()) {
        (Some(value), None) => Some(value.clone()),
        _ => None,
    }
}

// -- Responses --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemList<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSummary {
    pub map_id: String,
    pub title: String,
    pub visibility: Visibility,
    #[serde(with = "crate::timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSummary {
    pub element_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub report_id: String,
    pub map_id: String,
    pub status: ReportStatus,
    pub reason: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

// -- Errors --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub issue: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            issue: issue.into(),
        }
    }
}

/// `{ "error": { "code", "message", "details": [...] } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Vec<FieldIssue>,
}
