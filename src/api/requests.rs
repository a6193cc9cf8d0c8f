use crate::api::{ApiClient, ApiResult};
use crate::models::request::{
    LeadQuery, LeadRequest, LeadRequestCreate, RequestReceipt, RequestStatusUpdate,
};

/// Inbound leads. The whole router sits under the admin prefix, but
/// creation is still the public submit path and needs no session.
impl ApiClient {
    pub async fn list_requests(&self, query: &LeadQuery) -> ApiResult<Vec<LeadRequest>> {
        self.get_admin_query_json("/admin/requests/", query).await
    }

    pub async fn create_request(&self, lead: &LeadRequestCreate) -> ApiResult<RequestReceipt> {
        self.post_json("/admin/requests/", lead).await
    }

    pub async fn update_request(
        &self,
        request_id: i64,
        update: &RequestStatusUpdate,
    ) -> ApiResult<LeadRequest> {
        self.put_admin_json(&format!("/admin/requests/{}", request_id), update)
            .await
    }

    /// Quiz answers come in as a lead of type `quiz`; the backend
    /// attaches a promo code.
    pub async fn submit_quiz(&self, lead: &LeadRequestCreate) -> ApiResult<RequestReceipt> {
        self.post_json("/quiz/request", lead).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::api::client::stub::StubServer;
    use crate::models::admin::AdminSession;
    use crate::store::temp_store;

    #[tokio::test]
    async fn lead_routes_live_under_the_admin_prefix() {
        let server = StubServer::serve(vec![
            "[]",
            r#"{"id": 12, "name": "Иван", "phone": "79001234567",
                "type": "callback", "status": "processing",
                "created_at": "2026-08-20T09:15:00"}"#,
        ])
        .await;
        let store = Arc::new(temp_store());
        store
            .save_session(&AdminSession {
                session_token: "c0ffee".to_string(),
                expires_at: (Utc::now() + chrono::Duration::hours(1)).naive_utc(),
            })
            .unwrap();
        let client =
            ApiClient::new(server.base_url.as_str(), Duration::from_secs(5), store).unwrap();

        client.list_requests(&LeadQuery::default()).await.unwrap();
        let updated = client
            .update_request(
                12,
                &RequestStatusUpdate {
                    status: "processing".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "processing");

        let heads = server.requests();
        assert!(heads[0].starts_with("GET /admin/requests/ HTTP/1.1"));
        assert!(heads[0].contains("x-admin-token: c0ffee"));
        assert!(heads[1].starts_with("PUT /admin/requests/12 HTTP/1.1"));
    }
}
