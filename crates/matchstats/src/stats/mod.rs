pub mod catalog;
pub mod domain;
pub mod engine;
mod normalizer;
pub mod resolver;
pub mod tally;
pub mod tracking;

pub use catalog::{Catalog, CatalogDocument, CatalogError, CatalogSeed, SyncOutcome, SyncReport};
pub use domain::{
    Action, ActionCounts, ActionId, CalculationKind, ComputedMetricValue, GameId, Metric,
    MetricId, Polarity, RawActionCount,
};
pub use engine::{compute_metrics, MetricEngine, MetricEvaluationError};
pub use resolver::{required_actions_for, resolve_dependencies};
pub use tally::{TallyImportError, TallyImporter, TallySheet};
pub use tracking::{
    stats_router, CategoryBreakdown, RepositoryError, StatsRepository, StatsService,
    StatsServiceError,
};
