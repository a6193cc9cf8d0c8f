use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Instant;

use anyhow::anyhow;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{error, info};

use crate::api::{ApiError, ApiErrorKind, ApiResult};
use crate::media::collection::MediaCollection;
use crate::media::item::MediaId;
use crate::models::plot::{ImageReorderRequest, LandPlot, UploadedImage};

/// Backend surface the commit sequence drives.
/// [`ApiClient`](crate::api::ApiClient) implements it over HTTP; tests
/// substitute a recording double.
#[allow(async_fn_in_trait)]
pub trait MediaTransport {
    async fn fetch_plot(&self, plot_id: i64) -> ApiResult<LandPlot>;
    async fn delete_image(&self, plot_id: i64, image_id: i64) -> ApiResult<()>;
    async fn upload_image(
        &self,
        plot_id: i64,
        source: &Path,
        filename: &str,
        is_main: bool,
        order: i64,
    ) -> ApiResult<UploadedImage>;
    async fn reorder_images(&self, plot_id: i64, request: &ImageReorderRequest) -> ApiResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    Delete,
    Upload,
    Reorder,
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitPhase::Delete => "delete",
            CommitPhase::Upload => "upload",
            CommitPhase::Reorder => "reorder",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
pub struct ItemFailure {
    pub phase: CommitPhase,
    pub id: MediaId,
    pub message: String,
}

/// Outcome of one commit run. Deletions and uploads are best-effort, so
/// a report can carry successes and per-item failures side by side.
#[derive(Debug, Default)]
pub struct CommitReport {
    pub deleted: Vec<i64>,
    pub uploaded: Vec<i64>,
    pub failures: Vec<ItemFailure>,
    pub reordered: bool,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitErrorKind {
    /// Another commit for the same plot is still running.
    InFlight,
    /// The admin session was rejected; the run stopped where it was.
    Auth,
    /// The plot no longer exists on the backend.
    NotFound,
    /// The initial plot fetch failed.
    Fetch,
    /// The reorder payload or call failed; server state may be partial.
    Structural,
}

/// A failure that stopped the run. Carries whatever partial progress was
/// made so the caller can still report it.
#[derive(Debug)]
pub struct CommitError {
    pub kind: CommitErrorKind,
    pub report: CommitReport,
    pub error: anyhow::Error,
}

impl CommitError {
    fn new(kind: CommitErrorKind, report: CommitReport, error: anyhow::Error) -> Self {
        Self {
            kind,
            report,
            error,
        }
    }

    /// Folds the stop reason into an [`ApiError`] without losing its
    /// classification. The carried report is dropped, so read it first.
    pub fn into_api(self) -> ApiError {
        let kind = match self.kind {
            CommitErrorKind::Auth => ApiErrorKind::Auth,
            CommitErrorKind::NotFound => ApiErrorKind::NotFound,
            CommitErrorKind::InFlight => ApiErrorKind::Validation,
            CommitErrorKind::Fetch | CommitErrorKind::Structural => ApiErrorKind::Server,
        };
        ApiError::new(kind, self.error)
    }
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for CommitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

/// Plots with a commit currently running. Guards against double-submit;
/// entries are removed when the run finishes, panic included.
static COMMITS_IN_FLIGHT: LazyLock<DashMap<i64, Instant>> = LazyLock::new(DashMap::new);

struct InFlightGuard {
    plot_id: i64,
}

impl InFlightGuard {
    fn claim(plot_id: i64) -> Result<Self, CommitError> {
        match COMMITS_IN_FLIGHT.entry(plot_id) {
            Entry::Occupied(entry) => Err(CommitError::new(
                CommitErrorKind::InFlight,
                CommitReport::default(),
                anyhow!(
                    "commit for plot {} already running for {:?}",
                    plot_id,
                    entry.get().elapsed()
                ),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Ok(Self { plot_id })
            }
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        COMMITS_IN_FLIGHT.remove(&self.plot_id);
    }
}

/// Pushes the collection's state to the backend in three strict phases:
/// deletions, then uploads, then one bulk reorder. Deletions and uploads
/// are per-item best-effort; a reorder failure is structural and surfaces
/// as an error together with the partial report.
///
/// Successful uploads rewrite their items in place, so after a clean run
/// the collection holds only backend identities and a re-run of the same
/// commit converges instead of duplicating work.
pub async fn commit<T: MediaTransport>(
    transport: &T,
    plot_id: i64,
    collection: &mut MediaCollection,
) -> Result<CommitReport, CommitError> {
    let _guard = InFlightGuard::claim(plot_id)?;
    let start_time = Instant::now();
    let mut report = CommitReport::default();

    // The deletion set is computed against what the backend has right
    // now, not against a possibly stale earlier snapshot.
    let plot = match transport.fetch_plot(plot_id).await {
        Ok(plot) => plot,
        Err(err) => {
            let kind = match err.kind {
                ApiErrorKind::Auth => CommitErrorKind::Auth,
                ApiErrorKind::NotFound => CommitErrorKind::NotFound,
                _ => CommitErrorKind::Fetch,
            };
            return Err(CommitError::new(
                kind,
                report,
                err.into_anyhow().context("loading plot before commit"),
            ));
        }
    };

    let kept = collection.kept_server_ids();
    let doomed: Vec<i64> = plot
        .images
        .iter()
        .map(|image| image.id)
        .filter(|id| !kept.contains(id))
        .collect();
    for image_id in doomed {
        match transport.delete_image(plot_id, image_id).await {
            Ok(()) => report.deleted.push(image_id),
            Err(err) if err.kind == ApiErrorKind::NotFound => {
                // Already gone server-side, which is the state we wanted.
                info!("Image {} of plot {} was already deleted", image_id, plot_id);
                report.deleted.push(image_id);
            }
            Err(err) if err.kind == ApiErrorKind::Auth => {
                return Err(CommitError::new(
                    CommitErrorKind::Auth,
                    report,
                    err.into_anyhow(),
                ));
            }
            Err(err) => {
                error!("Failed to delete image {}: {:#}", image_id, err.error);
                report.failures.push(ItemFailure {
                    phase: CommitPhase::Delete,
                    id: MediaId::Server(image_id),
                    message: format!("{:#}", err.error),
                });
            }
        }
    }

    // Uploads run one at a time. Success rewrites the item to its backend
    // identity; failure leaves it local for the next run.
    let pending: Vec<(MediaId, String, String, bool, i64)> = collection
        .new_items()
        .filter_map(|item| {
            item.source_file().map(|file| {
                (
                    item.id(),
                    file.to_string(),
                    item.filename.clone(),
                    item.is_main,
                    item.order as i64,
                )
            })
        })
        .collect();
    for (id, file, filename, is_main, order) in pending {
        match transport
            .upload_image(plot_id, Path::new(&file), &filename, is_main, order)
            .await
        {
            Ok(uploaded) => {
                report.uploaded.push(uploaded.id);
                collection.promote(id, &uploaded);
            }
            Err(err) if err.kind == ApiErrorKind::Auth => {
                return Err(CommitError::new(
                    CommitErrorKind::Auth,
                    report,
                    err.into_anyhow(),
                ));
            }
            Err(err) => {
                error!("Failed to upload image {}: {:#}", filename, err.error);
                report.failures.push(ItemFailure {
                    phase: CommitPhase::Upload,
                    id,
                    message: format!("{:#}", err.error),
                });
            }
        }
    }

    // The reorder covers only rows that exist server-side, so items whose
    // upload failed simply stay out of it.
    let payload = collection.reorder_payload();
    if !payload.images.is_empty() {
        if let Err(err) = payload.validate() {
            return Err(CommitError::new(
                CommitErrorKind::Structural,
                report,
                err.context("reorder payload rejected before send"),
            ));
        }
        match transport.reorder_images(plot_id, &payload).await {
            Ok(()) => report.reordered = true,
            Err(err) => {
                let kind = if err.kind == ApiErrorKind::Auth {
                    CommitErrorKind::Auth
                } else {
                    CommitErrorKind::Structural
                };
                return Err(CommitError::new(
                    kind,
                    report,
                    err.into_anyhow().context("reordering images"),
                ));
            }
        }
    }

    info!(duration = &*format!("{:?}", start_time.elapsed());
        "Committed media of plot {}: {} deleted, {} uploaded, {} failed",
        plot_id,
        report.deleted.len(),
        report.uploaded.len(),
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::{Arc, Mutex};

    use arrayvec::ArrayString;
    use tokio::sync::Notify;

    use super::*;
    use crate::media::preview::StagedFile;
    use crate::models::plot::PlotImage;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Fetch,
        Delete(i64),
        Upload(String),
        Reorder(Vec<i64>),
    }

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<Call>>,
        images: Vec<PlotImage>,
        fetch_error: Option<ApiErrorKind>,
        missing_deletes: Vec<i64>,
        broken_deletes: Vec<i64>,
        auth_deletes: Vec<i64>,
        broken_uploads: Vec<String>,
        broken_reorder: bool,
        next_id: AtomicI64,
    }

    impl FakeBackend {
        fn with_images(images: Vec<PlotImage>) -> Self {
            Self {
                images,
                next_id: AtomicI64::new(100),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl MediaTransport for FakeBackend {
        async fn fetch_plot(&self, _plot_id: i64) -> ApiResult<LandPlot> {
            self.record(Call::Fetch);
            if let Some(kind) = self.fetch_error {
                return Err(ApiError::new(kind, anyhow!("fetch refused")));
            }
            Ok(plot_with_images(self.images.clone()))
        }

        async fn delete_image(&self, _plot_id: i64, image_id: i64) -> ApiResult<()> {
            self.record(Call::Delete(image_id));
            if self.missing_deletes.contains(&image_id) {
                return Err(ApiError::new(ApiErrorKind::NotFound, anyhow!("HTTP 404")));
            }
            if self.auth_deletes.contains(&image_id) {
                return Err(ApiError::new(ApiErrorKind::Auth, anyhow!("HTTP 401")));
            }
            if self.broken_deletes.contains(&image_id) {
                return Err(ApiError::new(ApiErrorKind::Server, anyhow!("HTTP 500")));
            }
            Ok(())
        }

        async fn upload_image(
            &self,
            _plot_id: i64,
            _source: &Path,
            filename: &str,
            _is_main: bool,
            _order: i64,
        ) -> ApiResult<UploadedImage> {
            self.record(Call::Upload(filename.to_string()));
            if self.broken_uploads.iter().any(|name| name == filename) {
                return Err(ApiError::new(ApiErrorKind::Server, anyhow!("HTTP 500")));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(UploadedImage {
                id,
                filename: format!("stored_{}", filename),
                path: format!("/uploads/plots/stored_{}", filename),
            })
        }

        async fn reorder_images(
            &self,
            _plot_id: i64,
            request: &ImageReorderRequest,
        ) -> ApiResult<()> {
            self.record(Call::Reorder(
                request.images.iter().map(|image| image.id).collect(),
            ));
            if self.broken_reorder {
                return Err(ApiError::new(ApiErrorKind::Server, anyhow!("HTTP 500")));
            }
            Ok(())
        }
    }

    fn plot_with_images(images: Vec<PlotImage>) -> LandPlot {
        let mut plot: LandPlot = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Участок у озера",
            "description": {"text": "", "attachments": []},
            "cadastral_numbers": [],
            "area": 1000.0,
            "price": 1500000,
            "price_per_sotka": 150000,
            "location": "с. Ая",
            "region": "Алтайский край",
            "land_category": "ИЖС",
            "permitted_use": "ИЖС",
            "features": [],
            "communications": [],
            "status": "available"
        }))
        .unwrap();
        plot.images = images;
        plot
    }

    fn image(id: i64, order: i64, is_main: bool) -> PlotImage {
        PlotImage {
            id,
            filename: format!("img{}.jpg", id),
            path: format!("/uploads/plots/img{}.jpg", id),
            is_main,
            order,
        }
    }

    fn staged(name: &str) -> StagedFile {
        StagedFile {
            source: PathBuf::from(format!("/tmp/in/{}", name)),
            filename: name.to_string(),
            preview: PathBuf::from(format!("/tmp/previews/{}.jpg", name)),
            fingerprint: ArrayString::from("0".repeat(64).as_str()).unwrap(),
            width: 100,
            height: 80,
        }
    }

    #[tokio::test]
    async fn phases_run_delete_upload_reorder_in_order() {
        let backend = FakeBackend::with_images(vec![image(1, 0, true), image(2, 1, false)]);
        let mut collection = MediaCollection::from_server(&backend.images);
        collection.remove(MediaId::Server(1));
        collection.add_files(vec![staged("y.jpg")]);

        let report = commit(&backend, 7, &mut collection).await.unwrap();

        assert_eq!(report.deleted, vec![1]);
        assert_eq!(report.uploaded, vec![100]);
        assert!(report.reordered);
        assert!(report.is_clean());

        let calls = backend.calls();
        assert_eq!(
            calls,
            vec![
                Call::Fetch,
                Call::Delete(1),
                Call::Upload("y.jpg".to_string()),
                Call::Reorder(vec![2, 100]),
            ]
        );
    }

    #[tokio::test]
    async fn clean_commit_converges_the_collection() {
        let backend = FakeBackend::with_images(vec![image(1, 0, true)]);
        let mut collection = MediaCollection::from_server(&backend.images);
        collection.add_files(vec![staged("y.jpg")]);

        commit(&backend, 8, &mut collection).await.unwrap();

        assert_eq!(collection.new_items().count(), 0);
        assert_eq!(collection.items()[1].id(), MediaId::Server(100));
        assert_eq!(collection.items()[1].filename, "stored_y.jpg");
        assert_eq!(collection.main_item().unwrap().id(), MediaId::Server(1));

        // A second run from the converged state only reorders.
        let backend =
            FakeBackend::with_images(vec![image(1, 0, true), image(100, 1, false)]);
        let report = commit(&backend, 8, &mut collection).await.unwrap();
        assert!(report.deleted.is_empty());
        assert!(report.uploaded.is_empty());
        assert_eq!(
            backend.calls(),
            vec![Call::Fetch, Call::Reorder(vec![1, 100])]
        );
    }

    #[tokio::test]
    async fn delete_failures_do_not_stop_the_batch() {
        let mut backend =
            FakeBackend::with_images(vec![image(1, 0, true), image(2, 1, false), image(3, 2, false)]);
        backend.broken_deletes = vec![1];
        let mut collection = MediaCollection::from_server(&backend.images);
        collection.remove(MediaId::Server(1));
        collection.remove(MediaId::Server(2));

        let report = commit(&backend, 9, &mut collection).await.unwrap();

        assert_eq!(report.deleted, vec![2]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].phase, CommitPhase::Delete);
        assert_eq!(report.failures[0].id, MediaId::Server(1));
        // The reorder still ran over the surviving row.
        assert!(report.reordered);
        assert!(backend.calls().contains(&Call::Reorder(vec![3])));
    }

    #[tokio::test]
    async fn already_deleted_rows_count_as_deleted() {
        let mut backend = FakeBackend::with_images(vec![image(5, 0, true), image(6, 1, false)]);
        backend.missing_deletes = vec![5];
        let mut collection = MediaCollection::from_server(&backend.images);
        collection.remove(MediaId::Server(5));

        let report = commit(&backend, 10, &mut collection).await.unwrap();

        assert_eq!(report.deleted, vec![5]);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn upload_failure_keeps_the_item_local() {
        let mut backend = FakeBackend::with_images(vec![]);
        backend.broken_uploads = vec!["bad.jpg".to_string()];
        let mut collection = MediaCollection::new();
        collection.add_files(vec![staged("good.jpg"), staged("bad.jpg")]);

        let report = commit(&backend, 11, &mut collection).await.unwrap();

        assert_eq!(report.uploaded, vec![100]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].phase, CommitPhase::Upload);
        // The failed item stays client-side; the reorder covers only the
        // uploaded one.
        assert_eq!(collection.new_items().count(), 1);
        assert!(backend.calls().contains(&Call::Reorder(vec![100])));
    }

    #[tokio::test]
    async fn reorder_failure_is_structural() {
        let mut backend = FakeBackend::with_images(vec![image(1, 0, true), image(2, 1, false)]);
        backend.broken_reorder = true;
        let mut collection = MediaCollection::from_server(&backend.images);
        collection.reorder(0, 1).unwrap();

        let err = commit(&backend, 12, &mut collection).await.unwrap_err();

        assert_eq!(err.kind, CommitErrorKind::Structural);
        assert!(err.report.deleted.is_empty());
        assert_eq!(backend.calls().last(), Some(&Call::Reorder(vec![2, 1])));
    }

    #[tokio::test]
    async fn reorder_is_skipped_when_nothing_survives() {
        let backend = FakeBackend::with_images(vec![image(4, 0, true)]);
        let mut collection = MediaCollection::from_server(&backend.images);
        collection.remove(MediaId::Server(4));

        let report = commit(&backend, 13, &mut collection).await.unwrap();

        assert_eq!(report.deleted, vec![4]);
        assert!(!report.reordered);
        assert_eq!(backend.calls(), vec![Call::Fetch, Call::Delete(4)]);
    }

    #[tokio::test]
    async fn auth_rejection_aborts_the_run() {
        let mut backend = FakeBackend::with_images(vec![image(1, 0, true), image(2, 1, false)]);
        backend.auth_deletes = vec![1];
        let mut collection = MediaCollection::from_server(&backend.images);
        collection.remove(MediaId::Server(1));
        collection.remove(MediaId::Server(2));
        collection.add_files(vec![staged("y.jpg")]);

        let err = commit(&backend, 14, &mut collection).await.unwrap_err();

        assert_eq!(err.kind, CommitErrorKind::Auth);
        assert!(err.report.deleted.is_empty());
        // Nothing past the rejected call was attempted.
        assert_eq!(backend.calls(), vec![Call::Fetch, Call::Delete(1)]);
    }

    #[tokio::test]
    async fn api_view_of_an_abort_keeps_the_auth_kind() {
        let mut backend = FakeBackend::with_images(vec![image(1, 0, true), image(2, 1, false)]);
        backend.auth_deletes = vec![1];
        let mut collection = MediaCollection::from_server(&backend.images);
        collection.remove(MediaId::Server(1));

        let err = commit(&backend, 16, &mut collection).await.unwrap_err();
        assert_eq!(err.into_api().kind, ApiErrorKind::Auth);
    }

    #[tokio::test]
    async fn missing_plot_fails_fast() {
        let mut backend = FakeBackend::with_images(vec![]);
        backend.fetch_error = Some(ApiErrorKind::NotFound);
        let mut collection = MediaCollection::new();

        let err = commit(&backend, 15, &mut collection).await.unwrap_err();

        assert_eq!(err.kind, CommitErrorKind::NotFound);
        assert_eq!(backend.calls(), vec![Call::Fetch]);
    }

    struct ParkedBackend {
        entered: Notify,
        release: Notify,
    }

    impl MediaTransport for ParkedBackend {
        async fn fetch_plot(&self, _plot_id: i64) -> ApiResult<LandPlot> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(plot_with_images(vec![]))
        }

        async fn delete_image(&self, _plot_id: i64, _image_id: i64) -> ApiResult<()> {
            unreachable!()
        }

        async fn upload_image(
            &self,
            _plot_id: i64,
            _source: &Path,
            _filename: &str,
            _is_main: bool,
            _order: i64,
        ) -> ApiResult<UploadedImage> {
            unreachable!()
        }

        async fn reorder_images(
            &self,
            _plot_id: i64,
            _request: &ImageReorderRequest,
        ) -> ApiResult<()> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn concurrent_commits_for_the_same_plot_are_rejected() {
        let backend = Arc::new(ParkedBackend {
            entered: Notify::new(),
            release: Notify::new(),
        });

        let worker = {
            let backend = backend.clone();
            tokio::spawn(async move {
                let mut collection = MediaCollection::new();
                commit(&*backend, 42, &mut collection).await
            })
        };
        backend.entered.notified().await;

        let mut other = MediaCollection::new();
        let err = commit(&*backend, 42, &mut other).await.unwrap_err();
        assert_eq!(err.kind, CommitErrorKind::InFlight);

        backend.release.notify_one();
        worker.await.unwrap().unwrap();
        assert!(COMMITS_IN_FLIGHT.get(&42).is_none());
    }
}
