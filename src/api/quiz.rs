use crate::api::{ApiClient, ApiResult};
use crate::models::quiz::{QuizQuestion, QuizQuestionPayload};

impl ApiClient {
    /// Active questions, ordered. Public endpoint, the quiz widget
    /// reads the same list.
    pub async fn quiz_questions(&self) -> ApiResult<Vec<QuizQuestion>> {
        self.get_json("/quiz/questions").await
    }

    pub async fn create_quiz_question(
        &self,
        payload: &QuizQuestionPayload,
    ) -> ApiResult<QuizQuestion> {
        self.post_admin_json("/quiz/questions", payload).await
    }

    pub async fn update_quiz_question(
        &self,
        question_id: i64,
        payload: &QuizQuestionPayload,
    ) -> ApiResult<QuizQuestion> {
        self.put_admin_json(&format!("/quiz/questions/{}", question_id), payload)
            .await
    }

    pub async fn delete_quiz_question(&self, question_id: i64) -> ApiResult<()> {
        self.delete_admin(&format!("/quiz/questions/{}", question_id))
            .await
    }
}
