use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Inbound lead as returned by `GET /admin/requests/`. The backend
/// stores naive UTC timestamps, hence `NaiveDateTime` here.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LeadRequest {
    pub id: i64,
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub answers: Option<serde_json::Value>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

fn default_status() -> String {
    "new".to_string()
}

/// Payload for `POST /admin/requests/` and `POST /quiz/request`.
#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq)]
pub struct LeadRequestCreate {
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<serde_json::Value>,
}

/// Filters for `GET /admin/requests/`, serialized to query parameters.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct LeadQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Body of `PUT /admin/requests/{id}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestStatusUpdate {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Response of `POST /admin/requests/` and `POST /quiz/request`. The
/// promo code is only generated for quiz leads.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestReceipt {
    pub status: String,
    #[serde(default)]
    pub promo_code: Option<String>,
}
