use crate::cli::ServeArgs;
use crate::infra::{seeded_adapters, AppState, ConsoleService, SeedData, TracingNotificationSink};
use crate::routes::with_selection_routes;
use accelerator_selection::config::{AppConfig, SelectionConfig};
use accelerator_selection::error::AppError;
use accelerator_selection::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let seed = match args.seed.take() {
        Some(path) => {
            info!(path = %path.display(), "loading seed submissions");
            SeedData::from_path(&path)?
        }
        None => SeedData::default(),
    };
    let service = Arc::new(build_service(&config.selection, seed)?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_selection_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        entity_kind = %config.selection.entity_kind,
        "selection console ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn build_service(
    selection: &SelectionConfig,
    seed: SeedData,
) -> Result<ConsoleService, AppError> {
    let formatter = selection.formatter()?;
    let adapters = seeded_adapters(seed)?;
    Ok(ConsoleService::new(
        adapters.store,
        adapters.importer,
        Arc::new(TracingNotificationSink),
        selection.entity_kind(),
    )
    .with_formatter(Arc::new(formatter)))
}
