use crate::cli::ServeArgs;
use crate::infra::{load_catalog, AppState, InMemoryStatsRepository};
use crate::routes::with_stats_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use matchstats::config::AppConfig;
use matchstats::error::AppError;
use matchstats::stats::StatsService;
use matchstats::telemetry;
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

    let catalog = Arc::new(load_catalog(&config.catalog)?);
    info!(
        actions = catalog.actions().len(),
        metrics = catalog.metrics().len(),
        source = ?config.catalog.path,
        "catalog loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        catalog: catalog.clone(),
    };

    let repository = Arc::new(InMemoryStatsRepository::default());
    let stats_service = Arc::new(StatsService::new(catalog, repository));

    let app = with_stats_routes(stats_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "match stats service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
