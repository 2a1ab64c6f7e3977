use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::stats::catalog::{Catalog, CatalogSeed};
use crate::stats::domain::{ActionId, GameId, MetricId, RawActionCount};
use crate::stats::tracking::repository::{apply_delta, RepositoryError, StatsRepository};
use crate::stats::tracking::{stats_router, StatsService};

pub(super) const GAME: GameId = GameId(7);

pub(super) fn catalog() -> Arc<Catalog> {
    Arc::new(
        CatalogSeed::standard()
            .into_catalog()
            .expect("seed catalog is valid"),
    )
}

pub(super) fn build_service() -> (StatsService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = StatsService::new(catalog(), repository.clone());
    (service, repository)
}

pub(super) fn stats_router_with_service(
    service: StatsService<MemoryRepository>,
) -> axum::Router {
    stats_router(Arc::new(service))
}

#[derive(Default)]
struct GameState {
    counts: HashMap<ActionId, RawActionCount>,
    selection: Vec<MetricId>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    games: Arc<Mutex<HashMap<GameId, GameState>>>,
}

impl MemoryRepository {
    pub(super) fn tracked_games(&self) -> usize {
        self.games.lock().expect("repository mutex poisoned").len()
    }
}

impl StatsRepository for MemoryRepository {
    fn counts(&self, game: GameId) -> Result<Vec<RawActionCount>, RepositoryError> {
        let guard = self.games.lock().expect("repository mutex poisoned");
        let mut records: Vec<RawActionCount> = guard
            .get(&game)
            .map(|state| state.counts.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by_key(|record| record.action_id);
        Ok(records)
    }

    fn upsert_count(
        &self,
        game: GameId,
        action: ActionId,
        count: u64,
    ) -> Result<RawActionCount, RepositoryError> {
        let mut guard = self.games.lock().expect("repository mutex poisoned");
        let record = RawActionCount {
            game_id: game,
            action_id: action,
            count,
            updated_at: Utc::now(),
        };
        guard
            .entry(game)
            .or_default()
            .counts
            .insert(action, record.clone());
        Ok(record)
    }

    fn adjust_count(
        &self,
        game: GameId,
        action: ActionId,
        delta: i64,
    ) -> Result<RawActionCount, RepositoryError> {
        let mut guard = self.games.lock().expect("repository mutex poisoned");
        let entry = guard
            .entry(game)
            .or_default()
            .counts
            .entry(action)
            .or_insert_with(|| RawActionCount {
                game_id: game,
                action_id: action,
                count: 0,
                updated_at: Utc::now(),
            });
        entry.count = apply_delta(entry.count, delta);
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    fn selected_metrics(&self, game: GameId) -> Result<Vec<MetricId>, RepositoryError> {
        let guard = self.games.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(&game)
            .map(|state| state.selection.clone())
            .unwrap_or_default())
    }

    fn replace_selection(
        &self,
        game: GameId,
        metric_ids: Vec<MetricId>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.games.lock().expect("repository mutex poisoned");
        guard.entry(game).or_default().selection = metric_ids;
        Ok(())
    }

    fn clear_game(&self, game: GameId) -> Result<(), RepositoryError> {
        let mut guard = self.games.lock().expect("repository mutex poisoned");
        guard.remove(&game);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl StatsRepository for UnavailableRepository {
    fn counts(&self, _game: GameId) -> Result<Vec<RawActionCount>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn upsert_count(
        &self,
        _game: GameId,
        _action: ActionId,
        _count: u64,
    ) -> Result<RawActionCount, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn adjust_count(
        &self,
        _game: GameId,
        _action: ActionId,
        _delta: i64,
    ) -> Result<RawActionCount, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn selected_metrics(&self, _game: GameId) -> Result<Vec<MetricId>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn replace_selection(
        &self,
        _game: GameId,
        _metric_ids: Vec<MetricId>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn clear_game(&self, _game: GameId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn unavailable_service() -> StatsService<UnavailableRepository> {
    StatsService::new(catalog(), Arc::new(UnavailableRepository))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
