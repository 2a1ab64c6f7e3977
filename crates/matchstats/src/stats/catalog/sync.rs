use super::super::domain::{Action, ActionId, Metric, MetricId, Polarity};
use super::super::normalizer::normalize_name;
use super::document::accept_definitions;
use super::{Catalog, CatalogDocument, CatalogError, CatalogSeed, SeedMetric};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolarityCorrection {
    pub action_id: ActionId,
    pub name: String,
    pub from: Polarity,
    pub to: Polarity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    pub metric: String,
    pub reference: String,
}

/// What a sync pass changed relative to the stored catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub actions_added: Vec<String>,
    pub polarity_corrections: Vec<PolarityCorrection>,
    pub duplicate_metrics_removed: Vec<MetricId>,
    pub metrics_added: Vec<String>,
    pub metrics_updated: Vec<String>,
    pub unresolved_references: Vec<UnresolvedReference>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.actions_added.is_empty()
            && self.polarity_corrections.is_empty()
            && self.duplicate_metrics_removed.is_empty()
            && self.metrics_added.is_empty()
            && self.metrics_updated.is_empty()
            && self.unresolved_references.is_empty()
    }
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub catalog: Catalog,
    pub report: SyncReport,
}

/// Reconciles a stored catalog document with a seed.
///
/// Entries are matched by name. Existing ids are kept and new entries get ids above
/// the current maximum, so an id is never handed to a different action or metric.
/// Actions and metrics that the seed does not mention are left untouched.
pub fn sync(document: CatalogDocument, seed: &CatalogSeed) -> Result<SyncOutcome, CatalogError> {
    let CatalogDocument { actions, metrics } = document;
    let mut report = SyncReport::default();

    let actions = sync_actions(actions, seed, &mut report)?;
    let metrics = collapse_duplicate_metrics(accept_definitions(metrics), &mut report);
    let metrics = sync_metrics(metrics, &actions, seed, &mut report)?;

    let catalog = Catalog::new(actions, metrics)?;

    if !report.is_clean() {
        info!(
            actions_added = report.actions_added.len(),
            polarity_corrections = report.polarity_corrections.len(),
            duplicate_metrics_removed = report.duplicate_metrics_removed.len(),
            metrics_added = report.metrics_added.len(),
            metrics_updated = report.metrics_updated.len(),
            unresolved_references = report.unresolved_references.len(),
            "catalog synced with seed"
        );
    }

    Ok(SyncOutcome { catalog, report })
}

fn sync_actions(
    mut actions: Vec<Action>,
    seed: &CatalogSeed,
    report: &mut SyncReport,
) -> Result<Vec<Action>, CatalogError> {
    let mut ids = IdAllocator::after(actions.iter().map(|action| action.id.0), "action");

    for seed_action in seed.actions() {
        let key = normalize_name(seed_action.name);
        match actions
            .iter_mut()
            .find(|action| normalize_name(&action.name) == key)
        {
            Some(existing) => {
                if existing.polarity != seed_action.polarity {
                    report.polarity_corrections.push(PolarityCorrection {
                        action_id: existing.id,
                        name: existing.name.clone(),
                        from: existing.polarity,
                        to: seed_action.polarity,
                    });
                    existing.polarity = seed_action.polarity;
                }
            }
            None => {
                actions.push(Action {
                    id: ActionId(ids.allocate()?),
                    name: seed_action.name.to_string(),
                    description: seed_action.description.to_string(),
                    category: seed_action.category.to_string(),
                    polarity: seed_action.polarity,
                });
                report.actions_added.push(seed_action.name.to_string());
            }
        }
    }

    Ok(actions)
}

/// Keeps the lowest id per metric name and points dependents at the survivor.
fn collapse_duplicate_metrics(
    mut metrics: Vec<Metric>,
    report: &mut SyncReport,
) -> Vec<Metric> {
    let mut survivors: HashMap<String, MetricId> = HashMap::new();
    let mut ordered: Vec<&Metric> = metrics.iter().collect();
    ordered.sort_by_key(|metric| metric.id);
    for metric in ordered {
        survivors.entry(normalize_name(&metric.name)).or_insert(metric.id);
    }

    let mut replaced: HashMap<MetricId, MetricId> = HashMap::new();
    metrics.retain(|metric| {
        let survivor = survivors[&normalize_name(&metric.name)];
        if survivor == metric.id {
            true
        } else {
            replaced.insert(metric.id, survivor);
            false
        }
    });

    if replaced.is_empty() {
        return metrics;
    }

    let mut removed: Vec<MetricId> = replaced.keys().copied().collect();
    removed.sort();
    report.duplicate_metrics_removed = removed;

    for metric in &mut metrics {
        let mut remapped = Vec::with_capacity(metric.depends_on.len());
        for dependency in &metric.depends_on {
            let target = replaced.get(dependency).copied().unwrap_or(*dependency);
            if !remapped.contains(&target) {
                remapped.push(target);
            }
        }
        metric.depends_on = remapped;
    }

    metrics
}

fn sync_metrics(
    mut metrics: Vec<Metric>,
    actions: &[Action],
    seed: &CatalogSeed,
    report: &mut SyncReport,
) -> Result<Vec<Metric>, CatalogError> {
    let action_ids: HashMap<String, ActionId> = actions
        .iter()
        .map(|action| (normalize_name(&action.name), action.id))
        .collect();

    let mut metric_ids: HashMap<String, MetricId> = metrics
        .iter()
        .map(|metric| (normalize_name(&metric.name), metric.id))
        .collect();
    let mut ids = IdAllocator::after(metrics.iter().map(|metric| metric.id.0), "metric");
    let mut fresh: HashSet<MetricId> = HashSet::new();
    for seed_metric in seed.metrics() {
        if let Entry::Vacant(slot) = metric_ids.entry(normalize_name(seed_metric.name)) {
            let id = MetricId(ids.allocate()?);
            fresh.insert(id);
            slot.insert(id);
        }
    }

    for seed_metric in seed.metrics() {
        let id = metric_ids[&normalize_name(seed_metric.name)];
        let synced = materialize(seed_metric, id, &action_ids, &metric_ids, report);

        if fresh.contains(&id) {
            report.metrics_added.push(synced.name.clone());
            metrics.push(synced);
        } else if let Some(existing) = metrics.iter_mut().find(|metric| metric.id == id) {
            let synced = Metric {
                name: existing.name.clone(),
                ..synced
            };
            if *existing != synced {
                report.metrics_updated.push(synced.name.clone());
                *existing = synced;
            }
        }
    }

    Ok(metrics)
}

/// Hands out ids above the highest stored one.
struct IdAllocator {
    next: Option<u32>,
    kind: &'static str,
}

impl IdAllocator {
    fn after(existing: impl Iterator<Item = u32>, kind: &'static str) -> Self {
        let next = match existing.max() {
            Some(highest) => highest.checked_add(1),
            None => Some(1),
        };
        Self { next, kind }
    }

    fn allocate(&mut self) -> Result<u32, CatalogError> {
        let id = self
            .next
            .ok_or(CatalogError::IdSpaceExhausted { kind: self.kind })?;
        self.next = id.checked_add(1);
        Ok(id)
    }
}

fn materialize(
    seed_metric: &SeedMetric,
    id: MetricId,
    action_ids: &HashMap<String, ActionId>,
    metric_ids: &HashMap<String, MetricId>,
    report: &mut SyncReport,
) -> Metric {
    let mut required_actions = Vec::with_capacity(seed_metric.required_actions.len());
    for name in &seed_metric.required_actions {
        match action_ids.get(&normalize_name(name)) {
            Some(action) if !required_actions.contains(action) => required_actions.push(*action),
            Some(_) => {}
            None => unresolved(seed_metric, name, report),
        }
    }

    let mut depends_on = Vec::with_capacity(seed_metric.depends_on.len());
    for name in &seed_metric.depends_on {
        match metric_ids.get(&normalize_name(name)) {
            Some(metric) if !depends_on.contains(metric) => depends_on.push(*metric),
            Some(_) => {}
            None => unresolved(seed_metric, name, report),
        }
    }

    Metric {
        id,
        name: seed_metric.name.to_string(),
        description: seed_metric.description.to_string(),
        formula: seed_metric.formula.to_string(),
        category: seed_metric.category.to_string(),
        calculation: seed_metric.calculation,
        required_actions,
        depends_on,
    }
}

fn unresolved(seed_metric: &SeedMetric, reference: &str, report: &mut SyncReport) {
    warn!(
        metric = seed_metric.name,
        reference, "seed metric references an unknown name; dropping the reference"
    );
    report.unresolved_references.push(UnresolvedReference {
        metric: seed_metric.name.to_string(),
        reference: reference.to_string(),
    });
}
