//! Live per-game tracking: action counters, metric selection, and on-demand
//! evaluation against the shared catalog snapshot.

pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use repository::{apply_delta, RepositoryError, StatsRepository};
pub use router::stats_router;
pub use service::{StatsService, StatsServiceError};
pub use views::{ActionTally, CategoryBreakdown};
