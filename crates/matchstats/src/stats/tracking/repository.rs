use crate::stats::domain::{ActionId, GameId, MetricId, RawActionCount};

/// Storage abstraction for per-game counters and metric selections.
///
/// Implementations must apply `adjust_count` as a single read-modify-write so that
/// concurrent increments of one counter are never lost.
pub trait StatsRepository: Send + Sync {
    fn counts(&self, game: GameId) -> Result<Vec<RawActionCount>, RepositoryError>;
    fn upsert_count(
        &self,
        game: GameId,
        action: ActionId,
        count: u64,
    ) -> Result<RawActionCount, RepositoryError>;
    fn adjust_count(
        &self,
        game: GameId,
        action: ActionId,
        delta: i64,
    ) -> Result<RawActionCount, RepositoryError>;
    fn selected_metrics(&self, game: GameId) -> Result<Vec<MetricId>, RepositoryError>;
    fn replace_selection(
        &self,
        game: GameId,
        metric_ids: Vec<MetricId>,
    ) -> Result<(), RepositoryError>;
    fn clear_game(&self, game: GameId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Applies a signed delta to a counter, clamping at zero and at `u64::MAX`.
pub fn apply_delta(current: u64, delta: i64) -> u64 {
    if delta >= 0 {
        current.saturating_add(delta.unsigned_abs())
    } else {
        current.saturating_sub(delta.unsigned_abs())
    }
}
