use std::path::{Path, PathBuf};

use anyhow::anyhow;
use futures::future::join_all;
use log::info;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::config::PUBLIC_CONFIG;
use crate::models::admin::{
    AdminInfo, AdminLogin, AdminSession, AdminStats, UploadedDocument, VisitData, VisitorStats,
};
use crate::utils::{PathExt, is_valid_document_ext, mime_for_ext};

impl ApiClient {
    /// Exchanges credentials for a session token and persists it.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AdminSession> {
        let payload = AdminLogin {
            username: username.to_string(),
            password: password.to_string(),
        };
        let session: AdminSession = self.post_json("/admin/login", &payload).await?;
        self.remember_session(&session)?;
        info!("Logged in as {}, session expires {}", username, session.expires_at);
        Ok(session)
    }

    /// Drops the session locally. The backend expires tokens on its
    /// own schedule, so there is no logout endpoint to call.
    pub fn logout(&self) -> ApiResult<()> {
        self.forget_session()?;
        Ok(())
    }

    pub async fn me(&self) -> ApiResult<AdminInfo> {
        self.get_admin_json("/admin/me").await
    }

    pub async fn stats(&self) -> ApiResult<AdminStats> {
        self.get_admin_json("/admin/stats").await
    }

    pub async fn visitor_stats(&self) -> ApiResult<VisitorStats> {
        self.get_admin_json("/admin/stats/visitors").await
    }

    /// Visit tracking is open to the public site, no session needed.
    pub async fn track_visit(&self, session_id: &str) -> ApiResult<()> {
        let payload = VisitData {
            session_id: session_id.to_string(),
        };
        let _: Value = self.post_json("/admin/track-visit", &payload).await?;
        Ok(())
    }

    /// Uploads one attachment file. Extension and size are checked
    /// locally first; the backend repeats both checks.
    pub async fn upload_document(
        &self,
        source: &Path,
        document_type: &str,
    ) -> ApiResult<UploadedDocument> {
        let ext = source.ext_lower();
        if !is_valid_document_ext(&ext) {
            return Err(ApiError::new(
                ApiErrorKind::Validation,
                anyhow!("unsupported document extension: {:?}", source),
            ));
        }
        let metadata = tokio::fs::metadata(source).await?;
        let limit_bytes = PUBLIC_CONFIG.upload_limit_mb * 1024 * 1024;
        if metadata.len() > limit_bytes {
            return Err(ApiError::new(
                ApiErrorKind::Validation,
                anyhow!(
                    "{:?} is {} bytes, above the {} MB upload limit",
                    source,
                    metadata.len(),
                    PUBLIC_CONFIG.upload_limit_mb
                ),
            ));
        }
        let bytes = tokio::fs::read(source).await?;
        let part = Part::bytes(bytes)
            .file_name(source.file_name_string())
            .mime_str(mime_for_ext(&ext))?;
        let form = Form::new()
            .part("file", part)
            .text("document_type", document_type.to_string());
        self.post_admin_multipart("/admin/upload-document", form)
            .await
    }

    /// Uploads a batch concurrently, one request per file, and reports
    /// each outcome next to its path.
    pub async fn upload_documents(
        &self,
        sources: &[PathBuf],
        document_type: &str,
    ) -> Vec<(PathBuf, ApiResult<UploadedDocument>)> {
        let uploads = sources
            .iter()
            .map(|source| self.upload_document(source, document_type));
        let results = join_all(uploads).await;
        sources.iter().cloned().zip(results).collect()
    }

    /// Fetches an uploaded attachment back, given the `url` stored on
    /// it. The download route is open, no session needed.
    pub async fn download_file(&self, url: &str) -> ApiResult<Vec<u8>> {
        self.get_bytes(&format!("/download/{}", download_path(url)))
            .await
    }
}

/// The download route resolves paths relative to the backend's uploads
/// directory, so the stored `/uploads/` prefix comes off first.
fn download_path(url: &str) -> &str {
    url.strip_prefix("/uploads/").unwrap_or(url)
}
