use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Result, anyhow};
use log::warn;
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::{ApiError, ApiErrorKind, ApiResult};
use crate::common::ADMIN_TOKEN_HEADER;
use crate::config::PUBLIC_CONFIG;
use crate::models::admin::AdminSession;
use crate::store::Store;

/// HTTP client for the AltaiLand backend. Holds the admin token and
/// mirrors it into the store, so one login survives across runs.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<Store>,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, store: Arc<Store>) -> Result<Self> {
        let token = store.load_session()?.map(|session| session.session_token);
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            store,
            token: RwLock::new(token),
        })
    }

    /// Client wired to the `ALTAI_*` environment configuration.
    pub fn from_config(store: Arc<Store>) -> Result<Self> {
        Self::new(
            PUBLIC_CONFIG.base_url(),
            Duration::from_secs(PUBLIC_CONFIG.http_timeout_secs),
            store,
        )
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn has_session(&self) -> bool {
        self.token
            .read()
            .map(|token| token.is_some())
            .unwrap_or(false)
    }

    pub(crate) fn remember_session(&self, session: &AdminSession) -> Result<()> {
        self.store.save_session(session)?;
        let mut slot = self
            .token
            .write()
            .map_err(|err| anyhow!("token lock poisoned: {:?}", err))?;
        *slot = Some(session.session_token.clone());
        Ok(())
    }

    pub fn forget_session(&self) -> Result<()> {
        self.store.clear_session()?;
        let mut slot = self
            .token
            .write()
            .map_err(|err| anyhow!("token lock poisoned: {:?}", err))?;
        *slot = None;
        Ok(())
    }

    fn require_token(&self) -> ApiResult<String> {
        let slot = self
            .token
            .read()
            .map_err(|err| anyhow!("token lock poisoned: {:?}", err))?;
        slot.clone().ok_or_else(|| {
            ApiError::new(
                ApiErrorKind::Auth,
                anyhow!("Отсутствует токен администратора"),
            )
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn execute(&self, builder: RequestBuilder, admin: bool) -> ApiResult<Response> {
        let builder = if admin {
            let token = self.require_token()?;
            builder.header(ADMIN_TOKEN_HEADER, token)
        } else {
            builder
        };
        let response = builder.send().await.map_err(|err| {
            ApiError::new(
                ApiErrorKind::Network,
                anyhow::Error::from(err).context("request failed"),
            )
        })?;
        self.check(response, admin).await
    }

    /// Maps a non-success response onto the error taxonomy. A 401/422 on
    /// an admin call means the stored session is no longer accepted, so
    /// it is dropped on the spot.
    async fn check(&self, response: Response, admin: bool) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = extract_detail(response).await;
        if admin
            && (status == StatusCode::UNAUTHORIZED || status == StatusCode::UNPROCESSABLE_ENTITY)
        {
            if let Err(err) = self.forget_session() {
                warn!("Failed to drop rejected session: {:#}", err);
            }
            warn!("Admin session rejected with HTTP {}", status.as_u16());
            return Err(ApiError::new(ApiErrorKind::Auth, anyhow!("Сессия истекла")));
        }
        let kind = match status {
            StatusCode::UNAUTHORIZED => ApiErrorKind::Auth,
            StatusCode::NOT_FOUND => ApiErrorKind::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiErrorKind::Validation,
            _ => ApiErrorKind::Server,
        };
        Err(ApiError::new(
            kind,
            anyhow!("HTTP {}: {}", status.as_u16(), detail),
        ))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.execute(self.http.get(self.url(path)), false).await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn get_query_json<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<T> {
        let response = self
            .execute(self.http.get(self.url(path)).query(query), false)
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn get_bytes(&self, path: &str) -> ApiResult<Vec<u8>> {
        let response = self.execute(self.http.get(self.url(path)), false).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub(crate) async fn get_admin_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.execute(self.http.get(self.url(path)), true).await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn get_admin_query_json<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<T> {
        let response = self
            .execute(self.http.get(self.url(path)).query(query), true)
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .execute(self.http.post(self.url(path)).json(body), false)
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn post_admin_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .execute(self.http.post(self.url(path)).json(body), true)
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn put_admin_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .execute(self.http.put(self.url(path)).json(body), true)
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn patch_admin_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .execute(self.http.patch(self.url(path)).json(body), true)
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn patch_empty(&self, path: &str) -> ApiResult<()> {
        self.execute(self.http.patch(self.url(path)), false).await?;
        Ok(())
    }

    pub(crate) async fn delete_public(&self, path: &str) -> ApiResult<()> {
        self.execute(self.http.delete(self.url(path)), false)
            .await?;
        Ok(())
    }

    pub(crate) async fn delete_admin(&self, path: &str) -> ApiResult<()> {
        self.execute(self.http.delete(self.url(path)), true).await?;
        Ok(())
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> ApiResult<T> {
        let response = self
            .execute(self.http.post(self.url(path)).multipart(form), false)
            .await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn post_admin_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> ApiResult<T> {
        let response = self
            .execute(self.http.post(self.url(path)).multipart(form), true)
            .await?;
        Ok(response.json::<T>().await?)
    }
}

/// FastAPI error bodies carry a `detail` field, either a string or a
/// validation list. Falls back to the raw body, truncated.
async fn extract_detail(response: Response) -> String {
    let body = match response.text().await {
        Ok(body) => body,
        Err(_) => return "<no body>".to_string(),
    };
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(detail) = value.get("detail") {
            return match detail.as_str() {
                Some(text) => text.to_string(),
                None => detail.to_string(),
            };
        }
    }
    body.chars().take(300).collect()
}
