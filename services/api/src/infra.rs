use chrono::Utc;
use matchstats::config::CatalogConfig;
use matchstats::error::AppError;
use matchstats::stats::catalog::{load_document, sync, Catalog, CatalogSeed, SyncReport};
use matchstats::stats::tracking::apply_delta;
use matchstats::stats::{ActionId, GameId, MetricId, RawActionCount};
use matchstats::stats::{RepositoryError, StatsRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) catalog: Arc<Catalog>,
}

#[derive(Default)]
struct GameRecord {
    counts: HashMap<ActionId, RawActionCount>,
    selection: Vec<MetricId>,
}

/// Process-local tracking store. Every operation runs under one lock, so counter
/// adjustments are atomic per (game, action).
#[derive(Default, Clone)]
pub(crate) struct InMemoryStatsRepository {
    games: Arc<Mutex<HashMap<GameId, GameRecord>>>,
}

impl StatsRepository for InMemoryStatsRepository {
    fn counts(&self, game: GameId) -> Result<Vec<RawActionCount>, RepositoryError> {
        let guard = self.games.lock().expect("repository mutex poisoned");
        let mut records: Vec<RawActionCount> = guard
            .get(&game)
            .map(|record| record.counts.values().cloned().collect())
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
        let now = Utc::now();
        let record = guard
            .entry(game)
            .or_default()
            .counts
            .entry(action)
            .or_insert_with(|| RawActionCount {
                game_id: game,
                action_id: action,
                count: 0,
                updated_at: now,
            });
        record.count = apply_delta(record.count, delta);
        record.updated_at = now;
        Ok(record.clone())
    }

    fn selected_metrics(&self, game: GameId) -> Result<Vec<MetricId>, RepositoryError> {
        let guard = self.games.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(&game)
            .map(|record| record.selection.clone())
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

/// Loads the configured catalog document, or the built-in seed when no path is set.
pub(crate) fn load_catalog(config: &CatalogConfig) -> Result<Catalog, AppError> {
    let Some(path) = config.path.as_ref() else {
        return Ok(CatalogSeed::standard().into_catalog()?);
    };

    let document = load_document(path)?;
    if !config.sync_with_seed {
        return Ok(Catalog::from_document(document)?);
    }

    let outcome = sync(document, &CatalogSeed::standard())?;
    log_sync_report(&outcome.report);
    Ok(outcome.catalog)
}

fn log_sync_report(report: &SyncReport) {
    for correction in &report.polarity_corrections {
        info!(
            action_id = %correction.action_id,
            action = %correction.name,
            from = %correction.from,
            to = %correction.to,
            "corrected action polarity"
        );
    }
    if !report.duplicate_metrics_removed.is_empty() {
        info!(removed = ?report.duplicate_metrics_removed, "collapsed duplicate metrics");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn upsert_keeps_one_record_per_action() {
        let repository = InMemoryStatsRepository::default();
        repository
            .upsert_count(GameId(1), ActionId(2), 4)
            .expect("upsert");
        repository
            .upsert_count(GameId(1), ActionId(2), 6)
            .expect("upsert");

        let records = repository.counts(GameId(1)).expect("counts");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 6);
    }

    #[test]
    fn adjust_saturates_at_zero() {
        let repository = InMemoryStatsRepository::default();
        let record = repository
            .adjust_count(GameId(1), ActionId(2), -1)
            .expect("adjust");
        assert_eq!(record.count, 0);

        repository
            .adjust_count(GameId(1), ActionId(2), 1)
            .expect("adjust");
        let record = repository
            .adjust_count(GameId(1), ActionId(2), 1)
            .expect("adjust");
        assert_eq!(record.count, 2);
    }

    #[test]
    fn clear_game_leaves_other_games() {
        let repository = InMemoryStatsRepository::default();
        repository
            .upsert_count(GameId(1), ActionId(1), 1)
            .expect("upsert");
        repository
            .upsert_count(GameId(2), ActionId(1), 1)
            .expect("upsert");
        repository
            .replace_selection(GameId(1), vec![MetricId(1)])
            .expect("select");

        repository.clear_game(GameId(1)).expect("clear");

        assert!(repository.counts(GameId(1)).expect("counts").is_empty());
        assert!(repository
            .selected_metrics(GameId(1))
            .expect("selection")
            .is_empty());
        assert_eq!(repository.counts(GameId(2)).expect("counts").len(), 1);
    }

    #[test]
    fn load_catalog_defaults_to_seed() {
        let catalog = load_catalog(&CatalogConfig {
            path: None,
            sync_with_seed: true,
        })
        .expect("seed loads");
        assert_eq!(catalog.actions().len(), 13);
        assert_eq!(catalog.metrics().len(), 6);
    }

    #[test]
    fn load_catalog_reports_missing_document() {
        let error = load_catalog(&CatalogConfig {
            path: Some(PathBuf::from("./no-such-catalog.json")),
            sync_with_seed: true,
        })
        .expect_err("missing file");
        assert!(matches!(error, AppError::Catalog(_)));
    }
}
