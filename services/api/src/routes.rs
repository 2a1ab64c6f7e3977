use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use matchstats::error::AppError;
use matchstats::stats::{
    compute_metrics, stats_router, ActionCounts, ComputedMetricValue, MetricId, StatsRepository,
    StatsService, TallyImporter,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct TallyReportRequest {
    pub(crate) tally_csv: String,
    #[serde(default)]
    pub(crate) metric_ids: Option<Vec<MetricId>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TallyReportResponse {
    pub(crate) counts: ActionCounts,
    pub(crate) unknown_actions: Vec<String>,
    pub(crate) metrics: Vec<ComputedMetricValue>,
}

pub(crate) fn with_stats_routes<R>(service: Arc<StatsService<R>>) -> axum::Router
where
    R: StatsRepository + 'static,
{
    stats_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/reports/tally",
            axum::routing::post(tally_report_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Evaluates a whole tally sheet in one request without touching tracked games.
pub(crate) async fn tally_report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<TallyReportRequest>,
) -> Result<Json<TallyReportResponse>, AppError> {
    let TallyReportRequest {
        tally_csv,
        metric_ids,
    } = payload;

    let reader = Cursor::new(tally_csv.into_bytes());
    let sheet = TallyImporter::from_reader(reader, &state.catalog)?;
    let metrics = compute_metrics(&state.catalog, metric_ids.as_deref(), &sheet.counts);

    Ok(Json(TallyReportResponse {
        counts: sheet.counts,
        unknown_actions: sheet.unknown_actions,
        metrics,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryStatsRepository;
    use axum::body::Body;
    use axum::http::Request;
    use matchstats::stats::CatalogSeed;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            catalog: Arc::new(
                CatalogSeed::standard()
                    .into_catalog()
                    .expect("seed catalog is valid"),
            ),
        }
    }

    fn app(state: AppState) -> axum::Router {
        let repository = Arc::new(InMemoryStatsRepository::default());
        let service = Arc::new(StatsService::new(state.catalog.clone(), repository));
        with_stats_routes(service).layer(Extension(state))
    }

    async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_reflects_startup_state() {
        let response = app(app_state(false))
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(app_state(true))
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json_body(response).await, json!({ "status": "ready" }));
    }

    #[tokio::test]
    async fn health_and_tracking_routes_share_one_router() {
        let router = app(app_state(true));

        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::post("/api/v1/games/3/actions/1/increment")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn tally_report_endpoint_computes_metrics() {
        let request = TallyReportRequest {
            tally_csv: "action,count\nShot on Target,3\nShot off Target,1\nRabona,2\n"
                .to_string(),
            metric_ids: Some(vec![MetricId(1)]),
        };

        let Json(body) = tally_report_endpoint(Extension(app_state(true)), Json(request))
            .await
            .expect("report builds");

        assert_eq!(body.unknown_actions, vec!["Rabona"]);
        assert_eq!(body.metrics.len(), 1);
        assert_eq!(body.metrics[0].value, 75.0);
    }

    #[tokio::test]
    async fn tally_report_endpoint_rejects_malformed_counts() {
        let request = TallyReportRequest {
            tally_csv: "action,count\nShot on Target,three\n".to_string(),
            metric_ids: None,
        };

        let error = tally_report_endpoint(Extension(app_state(true)), Json(request))
            .await
            .expect_err("malformed count");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
