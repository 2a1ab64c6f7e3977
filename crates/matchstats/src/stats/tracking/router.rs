use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::repository::StatsRepository;
use super::service::{StatsService, StatsServiceError};
use crate::stats::domain::{ActionCounts, ActionId, GameId, MetricId};
use crate::stats::engine::compute_metrics;
use crate::stats::resolver::{required_actions_for, resolve_dependencies};

/// Router exposing the catalog, ad hoc evaluation, and per-game tracking endpoints.
pub fn stats_router<R>(service: Arc<StatsService<R>>) -> Router
where
    R: StatsRepository + 'static,
{
    Router::new()
        .route("/api/v1/catalog/actions", get(actions_handler::<R>))
        .route("/api/v1/catalog/metrics", get(metrics_catalog_handler::<R>))
        .route("/api/v1/metrics/resolve", post(resolve_handler::<R>))
        .route(
            "/api/v1/metrics/required-actions",
            post(required_actions_handler::<R>),
        )
        .route("/api/v1/metrics/evaluate", post(evaluate_handler::<R>))
        .route(
            "/api/v1/games/:game_id",
            axum::routing::delete(clear_game_handler::<R>),
        )
        .route("/api/v1/games/:game_id/counts", get(counts_handler::<R>))
        .route(
            "/api/v1/games/:game_id/actions/:action_id",
            axum::routing::put(set_count_handler::<R>),
        )
        .route(
            "/api/v1/games/:game_id/actions/:action_id/increment",
            post(increment_handler::<R>),
        )
        .route(
            "/api/v1/games/:game_id/actions/:action_id/decrement",
            post(decrement_handler::<R>),
        )
        .route(
            "/api/v1/games/:game_id/selection",
            get(selection_handler::<R>).put(replace_selection_handler::<R>),
        )
        .route(
            "/api/v1/games/:game_id/relevant-actions",
            get(relevant_actions_handler::<R>),
        )
        .route(
            "/api/v1/games/:game_id/metrics",
            get(game_metrics_handler::<R>),
        )
        .route(
            "/api/v1/games/:game_id/breakdown",
            get(breakdown_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CategoryQuery {
    pub(crate) category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScopeQuery {
    pub(crate) scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetricSelection {
    #[serde(default)]
    pub(crate) metric_ids: Vec<MetricId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluationRequest {
    #[serde(default)]
    pub(crate) counts: ActionCounts,
    pub(crate) metric_ids: Option<Vec<MetricId>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountUpdate {
    pub(crate) count: u64,
}

pub(crate) async fn actions_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Query(query): Query<CategoryQuery>,
) -> Response
where
    R: StatsRepository + 'static,
{
    let catalog = service.catalog();
    let actions = match query.category.as_deref() {
        Some(category) => catalog.actions_in_category(category),
        None => catalog.actions().iter().collect(),
    };
    (StatusCode::OK, Json(actions)).into_response()
}

pub(crate) async fn metrics_catalog_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Query(query): Query<CategoryQuery>,
) -> Response
where
    R: StatsRepository + 'static,
{
    let catalog = service.catalog();
    let metrics = match query.category.as_deref() {
        Some(category) => catalog.metrics_in_category(category),
        None => catalog.metrics().iter().collect(),
    };
    (StatusCode::OK, Json(metrics)).into_response()
}

pub(crate) async fn resolve_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Json(request): Json<MetricSelection>,
) -> Response
where
    R: StatsRepository + 'static,
{
    let ordered = resolve_dependencies(service.catalog(), &request.metric_ids);
    (StatusCode::OK, Json(json!({ "ordered": ordered }))).into_response()
}

pub(crate) async fn required_actions_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Json(request): Json<MetricSelection>,
) -> Response
where
    R: StatsRepository + 'static,
{
    let action_ids = required_actions_for(service.catalog(), &request.metric_ids);
    (StatusCode::OK, Json(json!({ "action_ids": action_ids }))).into_response()
}

pub(crate) async fn evaluate_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Json(request): Json<EvaluationRequest>,
) -> Response
where
    R: StatsRepository + 'static,
{
    let values = compute_metrics(
        service.catalog(),
        request.metric_ids.as_deref(),
        &request.counts,
    );
    (StatusCode::OK, Json(values)).into_response()
}

pub(crate) async fn counts_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path(game_id): Path<u64>,
) -> Response
where
    R: StatsRepository + 'static,
{
    match service.raw_counts(GameId(game_id)) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn increment_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path((game_id, action_id)): Path<(u64, u32)>,
) -> Response
where
    R: StatsRepository + 'static,
{
    match service.increment(GameId(game_id), ActionId(action_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decrement_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path((game_id, action_id)): Path<(u64, u32)>,
) -> Response
where
    R: StatsRepository + 'static,
{
    match service.decrement(GameId(game_id), ActionId(action_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn set_count_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path((game_id, action_id)): Path<(u64, u32)>,
    Json(update): Json<CountUpdate>,
) -> Response
where
    R: StatsRepository + 'static,
{
    match service.set_count(GameId(game_id), ActionId(action_id), update.count) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn selection_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path(game_id): Path<u64>,
) -> Response
where
    R: StatsRepository + 'static,
{
    match service.selected_metrics(GameId(game_id)) {
        Ok(metric_ids) => {
            (StatusCode::OK, Json(json!({ "metric_ids": metric_ids }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn replace_selection_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path(game_id): Path<u64>,
    Json(request): Json<MetricSelection>,
) -> Response
where
    R: StatsRepository + 'static,
{
    match service.select_metrics(GameId(game_id), &request.metric_ids) {
        Ok(metric_ids) => {
            (StatusCode::OK, Json(json!({ "metric_ids": metric_ids }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn relevant_actions_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path(game_id): Path<u64>,
) -> Response
where
    R: StatsRepository + 'static,
{
    match service.relevant_actions(GameId(game_id)) {
        Ok(actions) => (StatusCode::OK, Json(actions)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn game_metrics_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path(game_id): Path<u64>,
    Query(query): Query<ScopeQuery>,
) -> Response
where
    R: StatsRepository + 'static,
{
    let game = GameId(game_id);
    let result = match query.scope.as_deref() {
        Some("all") => service.compute_metrics(game, None),
        Some("selected") | None => service.compute_selected(game),
        Some(other) => {
            let payload = json!({
                "error": format!("unknown scope '{other}', expected 'all' or 'selected'"),
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    match result {
        Ok(values) => (StatusCode::OK, Json(values)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn breakdown_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path(game_id): Path<u64>,
) -> Response
where
    R: StatsRepository + 'static,
{
    match service.category_breakdown(GameId(game_id)) {
        Ok(breakdown) => (StatusCode::OK, Json(breakdown)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn clear_game_handler<R>(
    State(service): State<Arc<StatsService<R>>>,
    Path(game_id): Path<u64>,
) -> Response
where
    R: StatsRepository + 'static,
{
    match service.clear_game(GameId(game_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: StatsServiceError) -> Response {
    let status = match error {
        StatsServiceError::UnknownAction(_) => StatusCode::NOT_FOUND,
        StatsServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
