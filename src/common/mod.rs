pub const VALID_IMAGE_EXTENSIONS: &'static [&'static str] = &[
    "jpg", "jpeg", "jfif", "jpe", "png", "tif", "tiff", "webp", "bmp",
];

pub const VALID_DOCUMENT_EXTENSIONS: &'static [&'static str] =
    &["pdf", "doc", "docx", "txt", "rtf", "xls", "xlsx"];

pub const MAX_UPLOAD_SIZE_MB: u64 = 10;

pub const PREVIEW_MAX_DIMENSION: u32 = 1280;

pub const CLIENT_ID_LENGTH: usize = 16;

pub const DRAFT_KEY: &'static str = "plot_draft";

pub const DRAFT_IMAGES_KEY: &'static str = "plot_draft_images";

pub const CONTACTS_CACHE_KEY: &'static str = "contact_info";

pub const CONTACTS_CACHE_TTL_SECS: i64 = 60 * 60;

pub const TRACK_VISIT_INTERVAL_SECS: u64 = 60;

pub const ADMIN_TOKEN_HEADER: &'static str = "X-Admin-Token";

use std::sync::LazyLock;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::runtime::{Builder, Runtime};

pub static CURRENT_NUM_THREADS: LazyLock<usize> = LazyLock::new(|| rayon::current_num_threads());

// Tokio runtime for all network calls driven from the synchronous CLI entry point.
pub static API_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .worker_threads(*CURRENT_NUM_THREADS)
        .thread_name("api-io-worker")
        .enable_all()
        .build()
        .expect("Failed to build API Tokio runtime")
});

// Dedicated pool for CPU-bound preview staging, kept apart from the
// global rayon pool.
pub static STAGING_RAYON_POOL: LazyLock<ThreadPool> = LazyLock::new(|| {
    ThreadPoolBuilder::new()
        .num_threads(*CURRENT_NUM_THREADS)
        .thread_name(|i| format!("staging-worker-{}", i))
        .build()
        .expect("Failed to build staging Rayon pool")
});
