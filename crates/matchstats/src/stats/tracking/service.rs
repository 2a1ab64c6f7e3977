use std::sync::Arc;

use tracing::debug;

use super::repository::{RepositoryError, StatsRepository};
use super::views::{ActionTally, CategoryBreakdown};
use crate::stats::catalog::Catalog;
use crate::stats::domain::{
    Action, ActionCounts, ActionId, ComputedMetricValue, GameId, MetricId, RawActionCount,
};
use crate::stats::engine::compute_metrics;
use crate::stats::resolver::{required_actions_for, resolve_dependencies};

/// Service composing the catalog snapshot, the counter repository, and the engine.
pub struct StatsService<R> {
    catalog: Arc<Catalog>,
    repository: Arc<R>,
}

impl<R> StatsService<R>
where
    R: StatsRepository + 'static,
{
    pub fn new(catalog: Arc<Catalog>, repository: Arc<R>) -> Self {
        Self {
            catalog,
            repository,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn increment(
        &self,
        game: GameId,
        action: ActionId,
    ) -> Result<RawActionCount, StatsServiceError> {
        self.adjust(game, action, 1)
    }

    /// Decrements a counter; a counter already at zero stays at zero.
    pub fn decrement(
        &self,
        game: GameId,
        action: ActionId,
    ) -> Result<RawActionCount, StatsServiceError> {
        self.adjust(game, action, -1)
    }

    pub fn set_count(
        &self,
        game: GameId,
        action: ActionId,
        count: u64,
    ) -> Result<RawActionCount, StatsServiceError> {
        self.ensure_action(action)?;
        let record = self.repository.upsert_count(game, action, count)?;
        debug!(%game, %action, count = record.count, "action count set");
        Ok(record)
    }

    pub fn raw_counts(&self, game: GameId) -> Result<Vec<RawActionCount>, StatsServiceError> {
        Ok(self.repository.counts(game)?)
    }

    pub fn counts(&self, game: GameId) -> Result<ActionCounts, StatsServiceError> {
        let records = self.repository.counts(game)?;
        Ok(ActionCounts::from_records(&records))
    }

    /// Replaces the game's metric selection. Unknown and repeated ids are dropped;
    /// the order of first appearance is kept. Returns the stored selection.
    pub fn select_metrics(
        &self,
        game: GameId,
        metric_ids: &[MetricId],
    ) -> Result<Vec<MetricId>, StatsServiceError> {
        let mut selection: Vec<MetricId> = Vec::with_capacity(metric_ids.len());
        for id in metric_ids {
            if self.catalog.metric(*id).is_some() && !selection.contains(id) {
                selection.push(*id);
            }
        }

        self.repository.replace_selection(game, selection.clone())?;
        Ok(selection)
    }

    pub fn selected_metrics(&self, game: GameId) -> Result<Vec<MetricId>, StatsServiceError> {
        Ok(self.repository.selected_metrics(game)?)
    }

    /// Actions needed to evaluate the game's selection, including the actions of
    /// metrics the selection depends on. Catalog order.
    pub fn relevant_actions(&self, game: GameId) -> Result<Vec<Action>, StatsServiceError> {
        let selection = self.repository.selected_metrics(game)?;
        let ordered = resolve_dependencies(&self.catalog, &selection);
        let required = required_actions_for(&self.catalog, &ordered);

        Ok(self
            .catalog
            .actions()
            .iter()
            .filter(|action| required.contains(&action.id))
            .cloned()
            .collect())
    }

    /// Evaluates `selected` (plus dependencies) or, with `None`, the whole catalog.
    pub fn compute_metrics(
        &self,
        game: GameId,
        selected: Option<&[MetricId]>,
    ) -> Result<Vec<ComputedMetricValue>, StatsServiceError> {
        let counts = self.counts(game)?;
        Ok(compute_metrics(&self.catalog, selected, &counts))
    }

    /// Evaluates the stored selection. An empty selection yields no values.
    pub fn compute_selected(
        &self,
        game: GameId,
    ) -> Result<Vec<ComputedMetricValue>, StatsServiceError> {
        let selection = self.repository.selected_metrics(game)?;
        if selection.is_empty() {
            return Ok(Vec::new());
        }
        self.compute_metrics(game, Some(&selection))
    }

    pub fn category_breakdown(
        &self,
        game: GameId,
    ) -> Result<Vec<CategoryBreakdown>, StatsServiceError> {
        let counts = self.counts(game)?;

        let breakdown = self
            .catalog
            .action_categories()
            .into_iter()
            .map(|category| {
                let actions: Vec<ActionTally> = self
                    .catalog
                    .actions_in_category(category)
                    .into_iter()
                    .map(|action| ActionTally {
                        action_id: action.id,
                        name: action.name.clone(),
                        polarity: action.polarity,
                        count: counts.get(action.id),
                    })
                    .collect();
                let total = actions
                    .iter()
                    .fold(0u64, |sum, tally| sum.saturating_add(tally.count));

                CategoryBreakdown {
                    category: category.to_string(),
                    total,
                    actions,
                }
            })
            .collect();

        Ok(breakdown)
    }

    pub fn clear_game(&self, game: GameId) -> Result<(), StatsServiceError> {
        self.repository.clear_game(game)?;
        debug!(%game, "tracking data cleared");
        Ok(())
    }

    fn adjust(
        &self,
        game: GameId,
        action: ActionId,
        delta: i64,
    ) -> Result<RawActionCount, StatsServiceError> {
        self.ensure_action(action)?;
        let record = self.repository.adjust_count(game, action, delta)?;
        debug!(%game, %action, count = record.count, "action count adjusted");
        Ok(record)
    }

    fn ensure_action(&self, action: ActionId) -> Result<(), StatsServiceError> {
        if self.catalog.contains_action(action) {
            Ok(())
        } else {
            Err(StatsServiceError::UnknownAction(action))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatsServiceError {
    #[error("unknown action {0}")]
    UnknownAction(ActionId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
