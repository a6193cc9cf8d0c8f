use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct QuizQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub order: i64,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Create/update payload for quiz questions.
#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq)]
pub struct QuizQuestionPayload {
    pub question: String,
    pub options: Vec<String>,
    pub order: i64,
    pub is_active: bool,
}
