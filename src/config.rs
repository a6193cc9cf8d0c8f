use std::path::PathBuf;
use std::sync::LazyLock;

use dotenv::dotenv;
use serde::Deserialize;

/// Process-wide configuration, loaded once from `.env` / environment
/// variables prefixed with `ALTAI_` (e.g. `ALTAI_API_URL`).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PublicConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_upload_limit_mb")]
    pub upload_limit_mb: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_upload_limit_mb() -> u64 {
    crate::common::MAX_UPLOAD_SIZE_MB
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl PublicConfig {
    /// Base URL with any trailing slash removed, so endpoint paths can
    /// always be joined with a single `/`.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn preview_dir(&self) -> PathBuf {
        self.data_dir.join("previews")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("admin.redb")
    }
}

pub static PUBLIC_CONFIG: LazyLock<PublicConfig> = LazyLock::new(|| {
    dotenv().ok();
    envy::prefixed("ALTAI_")
        .from_env::<PublicConfig>()
        .expect("Failed to read ALTAI_* configuration from environment")
});
