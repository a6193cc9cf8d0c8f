use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::common::TRACK_VISIT_INTERVAL_SECS;

/// Visit heartbeat: one session id per process, posted on a fixed
/// interval so the visitor counters see the session as online. The
/// task stops when the tracker is dropped.
pub struct VisitTracker {
    session_id: String,
    handle: JoinHandle<()>,
}

impl VisitTracker {
    /// Starts the heartbeat. The first beat fires immediately, the
    /// rest every [`TRACK_VISIT_INTERVAL_SECS`]. Failed beats are
    /// logged and skipped, never fatal.
    pub fn start(client: Arc<ApiClient>) -> Self {
        let session_id = Uuid::new_v4().to_string();
        let beats = session_id.clone();
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(Duration::from_secs(TRACK_VISIT_INTERVAL_SECS));
            loop {
                timer.tick().await;
                if let Err(err) = client.track_visit(&beats).await {
                    warn!("Visit heartbeat failed: {}", err);
                }
            }
        });
        info!("Visit heartbeat started, session {}", session_id);
        Self { session_id, handle }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for VisitTracker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
