use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

/// Response of `POST /admin/login`. The token is opaque; expiry is a
/// naive UTC timestamp set by the backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AdminSession {
    pub session_token: String,
    pub expires_at: NaiveDateTime,
}

/// Response of `GET /admin/me`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AdminInfo {
    pub id: i64,
    pub username: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AdminStats {
    pub total_requests: u64,
    pub new_requests: u64,
    pub completed_requests: u64,
    pub total_plots: u64,
    pub available_plots: u64,
    pub quiz_questions: u64,
    pub quiz_completions: u64,
    pub current_online: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HourlyVisitors {
    pub time: String,
    pub visitors: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DailyVisitors {
    pub date: String,
    pub visitors: u64,
}

/// Response of `GET /admin/stats/visitors`: 24 hourly points, 7 daily,
/// 30 monthly.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VisitorStats {
    pub hourly: Vec<HourlyVisitors>,
    pub daily: Vec<DailyVisitors>,
    pub monthly: Vec<DailyVisitors>,
}

/// Body of `POST /admin/track-visit`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VisitData {
    pub session_id: String,
}

/// Response of `POST /admin/upload-document`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UploadedDocument {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
}
