use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::media::commit::MediaTransport;
use crate::models::plot::{ImageReorderRequest, LandPlot, UploadedImage};
use crate::utils::{PathExt, is_valid_image_ext, mime_for_ext};

/// Image endpoints live on the plot router and take no session header.
impl MediaTransport for ApiClient {
    /// The public route 404s on hidden plots, so a logged-in operator
    /// reads through the admin route and can edit hidden galleries.
    async fn fetch_plot(&self, plot_id: i64) -> ApiResult<LandPlot> {
        if self.has_session() {
            self.admin_get_plot(plot_id).await
        } else {
            self.get_plot(plot_id).await
        }
    }

    async fn delete_image(&self, plot_id: i64, image_id: i64) -> ApiResult<()> {
        self.delete_public(&format!("/plots/{}/images/{}", plot_id, image_id))
            .await
    }

    async fn upload_image(
        &self,
        plot_id: i64,
        source: &Path,
        filename: &str,
        is_main: bool,
        order: i64,
    ) -> ApiResult<UploadedImage> {
        let ext = source.ext_lower();
        if !is_valid_image_ext(&ext) {
            return Err(ApiError::new(
                ApiErrorKind::Validation,
                anyhow::anyhow!("unsupported image extension: {:?}", source),
            ));
        }
        let bytes = tokio::fs::read(source).await?;
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_for_ext(&ext))?;
        let form = Form::new()
            .part("file", part)
            .text("is_main", is_main.to_string())
            .text("order", order.to_string());
        self.post_multipart(&format!("/plots/{}/images/", plot_id), form)
            .await
    }

    async fn reorder_images(&self, plot_id: i64, request: &ImageReorderRequest) -> ApiResult<()> {
        let _: Value = self
            .post_json(&format!("/plots/{}/images/reorder", plot_id), request)
            .await?;
        Ok(())
    }
}

impl ApiClient {
    /// Flips the main flag on the backend directly, without going
    /// through a working-set commit.
    pub async fn set_main_image(&self, plot_id: i64, image_id: i64) -> ApiResult<()> {
        self.patch_empty(&format!("/plots/{}/images/{}/main", plot_id, image_id))
            .await
    }
}
