use crate::cli::ServeArgs;
use crate::infra::{ApiContext, AppState};
use crate::routes::api_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use staycheck::config::{AppConfig, VisionBackendKind, VisionConfig};
use staycheck::error::ApiError;
use staycheck::store::InMemoryStore;
use staycheck::telemetry;
use staycheck::vision::{AnthropicVision, OpenAiVision, VisionAnalyzer};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), ApiError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(upload_dir) = args.upload_dir.take() {
        config.uploads.directory = upload_dir;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    tokio::fs::create_dir_all(&config.uploads.directory).await?;

    let store = Arc::new(InMemoryStore::default());
    let vision = build_vision(&config.vision);
    let ctx = Arc::new(ApiContext::new(
        store,
        vision,
        config.uploads.directory.clone(),
    ));

    let app = api_router(ctx, &config.uploads.directory)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, backend = vision_label(&config.vision), "inspection service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_vision(config: &VisionConfig) -> Arc<dyn VisionAnalyzer> {
    match config.backend {
        VisionBackendKind::Anthropic => Arc::new(AnthropicVision::new(
            config.base_url.clone(),
            config.model.clone(),
            config.api_key.clone().unwrap_or_default(),
            config.timeout,
        )),
        VisionBackendKind::OpenAiCompatible => Arc::new(OpenAiVision::new(
            config.base_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            config.timeout,
        )),
    }
}

fn vision_label(config: &VisionConfig) -> &'static str {
    match config.backend {
        VisionBackendKind::Anthropic => "anthropic",
        VisionBackendKind::OpenAiCompatible => "openai-compatible",
    }
}
