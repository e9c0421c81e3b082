use metrics_exporter_prometheus::PrometheusHandle;
use staycheck::error::ApiError;
use staycheck::inspection::InspectionService;
use staycheck::store::InspectionStore;
use staycheck::vision::VisionAnalyzer;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared handles the route handlers work with. Passed around as
/// `Arc<ApiContext<_, _>>` router state.
pub(crate) struct ApiContext<S, V: ?Sized> {
    pub(crate) store: Arc<S>,
    pub(crate) inspections: Arc<InspectionService<S, V>>,
    pub(crate) upload_dir: PathBuf,
}

impl<S, V> ApiContext<S, V>
where
    S: InspectionStore,
    V: VisionAnalyzer + ?Sized,
{
    pub(crate) fn new(store: Arc<S>, vision: Arc<V>, upload_dir: PathBuf) -> Self {
        let inspections = Arc::new(InspectionService::new(store.clone(), vision));
        Self {
            store,
            inspections,
            upload_dir,
        }
    }
}

/// Write an upload to disk under a fresh unique name, keeping the original
/// extension (`jpg` when the name carries none).
pub(crate) async fn store_upload(
    upload_dir: &Path,
    original_name: Option<&str>,
    bytes: &[u8],
) -> Result<PathBuf, ApiError> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let extension = original_name
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext))
        .filter(|ext| !ext.is_empty())
        .unwrap_or("jpg");
    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let path = upload_dir.join(file_name);

    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
