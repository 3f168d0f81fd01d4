//! Shared state for the API layer.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::KvStore;
use crate::pipeline::triage::TriageCoordinator;

/// Shared context for all API routes. Cheap to clone.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<KvStore>,
    pub coordinator: Arc<TriageCoordinator>,
    pub config: Arc<AppConfig>,
}

impl ApiContext {
    pub fn new(
        store: Arc<KvStore>,
        coordinator: Arc<TriageCoordinator>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            coordinator,
            config,
        }
    }
}

/// Run blocking store or pipeline work off the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, crate::api::error::ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| crate::api::error::ApiError::Internal(format!("Worker task failed: {e}")))
}
