//! Immutable action and metric reference data.
//!
//! A [`Catalog`] is validated once when it is built (duplicate identities, dangling
//! required actions, dependency cycles) and then shared read-only with the resolver,
//! the calculation engine and the tracking service.

mod document;
mod seed;
mod sync;
mod validation;

pub use document::{CatalogDocument, MetricDefinition, MetricDefinitionError};
pub use seed::{CatalogSeed, SeedAction, SeedMetric};
pub use sync::{sync, PolarityCorrection, SyncOutcome, SyncReport, UnresolvedReference};

use super::domain::{Action, ActionId, Metric, MetricId};
use document::accept_definitions;
use super::normalizer::normalize_name;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Catalog {
    actions: Vec<Action>,
    metrics: Vec<Metric>,
    action_index: HashMap<ActionId, usize>,
    metric_index: HashMap<MetricId, usize>,
}

impl Catalog {
    pub fn new(actions: Vec<Action>, metrics: Vec<Metric>) -> Result<Self, CatalogError> {
        validation::validate(&actions, &metrics)?;
        Ok(Self::assemble(actions, metrics))
    }

    /// Builds the lookup tables without validating; only for callers that already
    /// checked the data or that exercise the evaluator against broken catalogs.
    pub(crate) fn assemble(actions: Vec<Action>, metrics: Vec<Metric>) -> Self {
        let action_index = actions
            .iter()
            .enumerate()
            .map(|(position, action)| (action.id, position))
            .collect();
        let metric_index = metrics
            .iter()
            .enumerate()
            .map(|(position, metric)| (metric.id, position))
            .collect();

        Self {
            actions,
            metrics,
            action_index,
            metric_index,
        }
    }

    /// Builds a catalog from a parsed document. Metrics with an unsupported
    /// calculation kind are logged and left out.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let CatalogDocument { actions, metrics } = document;
        Self::new(actions, accept_definitions(metrics))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        Self::from_document(read_document(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        Self::from_document(load_document(path)?)
    }

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            actions: self.actions.clone(),
            metrics: self.metrics.iter().map(MetricDefinition::from).collect(),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn metric_ids(&self) -> Vec<MetricId> {
        self.metrics.iter().map(|metric| metric.id).collect()
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.action_index
            .get(&id)
            .and_then(|position| self.actions.get(*position))
    }

    pub fn metric(&self, id: MetricId) -> Option<&Metric> {
        self.metric_index
            .get(&id)
            .and_then(|position| self.metrics.get(*position))
    }

    pub fn contains_action(&self, id: ActionId) -> bool {
        self.action_index.contains_key(&id)
    }

    pub fn action_by_name(&self, name: &str) -> Option<&Action> {
        let key = normalize_name(name);
        self.actions
            .iter()
            .find(|action| normalize_name(&action.name) == key)
    }

    pub fn metric_by_name(&self, name: &str) -> Option<&Metric> {
        let key = normalize_name(name);
        self.metrics
            .iter()
            .find(|metric| normalize_name(&metric.name) == key)
    }

    pub fn actions_in_category(&self, category: &str) -> Vec<&Action> {
        let key = normalize_name(category);
        self.actions
            .iter()
            .filter(|action| normalize_name(&action.category) == key)
            .collect()
    }

    pub fn metrics_in_category(&self, category: &str) -> Vec<&Metric> {
        let key = normalize_name(category);
        self.metrics
            .iter()
            .filter(|metric| normalize_name(&metric.category) == key)
            .collect()
    }

    /// Action categories in first-seen order, one entry per normalized name and
    /// spelled as first seen.
    pub fn action_categories(&self) -> Vec<&str> {
        first_seen(self.actions.iter().map(|action| action.category.as_str()))
    }

    pub fn metric_categories(&self) -> Vec<&str> {
        first_seen(self.metrics.iter().map(|metric| metric.category.as_str()))
    }
}

pub fn read_document<R: Read>(reader: R) -> Result<CatalogDocument, CatalogError> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn load_document<P: AsRef<Path>>(path: P) -> Result<CatalogDocument, CatalogError> {
    let file = std::fs::File::open(path)?;
    read_document(std::io::BufReader::new(file))
}

fn first_seen<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut keys = HashSet::new();
    values
        .filter(|value| keys.insert(normalize_name(value)))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog document: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate action id {0}")]
    DuplicateActionId(ActionId),
    #[error("duplicate action name '{0}'")]
    DuplicateActionName(String),
    #[error("duplicate metric id {0}")]
    DuplicateMetricId(MetricId),
    #[error("duplicate metric name '{0}'")]
    DuplicateMetricName(String),
    #[error("metric {metric} requires unknown action {action}")]
    UnknownRequiredAction { metric: MetricId, action: ActionId },
    #[error("metric dependency cycle: {}", format_path(path))]
    DependencyCycle { path: Vec<MetricId> },
    #[error("no {kind} ids left to allocate")]
    IdSpaceExhausted { kind: &'static str },
}

fn format_path(path: &[MetricId]) -> String {
    path.iter()
        .map(MetricId::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
