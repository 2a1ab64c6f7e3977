use super::super::domain::{Action, Metric, MetricId};
use super::super::normalizer::normalize_name;
use super::CatalogError;
use std::collections::{HashMap, HashSet};
use tracing::warn;

pub(super) fn validate(actions: &[Action], metrics: &[Metric]) -> Result<(), CatalogError> {
    let mut action_ids = HashSet::new();
    let mut action_names = HashSet::new();
    for action in actions {
        if !action_ids.insert(action.id) {
            return Err(CatalogError::DuplicateActionId(action.id));
        }
        if !action_names.insert(normalize_name(&action.name)) {
            return Err(CatalogError::DuplicateActionName(action.name.clone()));
        }
    }

    let mut metric_ids = HashSet::new();
    let mut metric_names = HashSet::new();
    for metric in metrics {
        if !metric_ids.insert(metric.id) {
            return Err(CatalogError::DuplicateMetricId(metric.id));
        }
        if !metric_names.insert(normalize_name(&metric.name)) {
            return Err(CatalogError::DuplicateMetricName(metric.name.clone()));
        }
    }

    for metric in metrics {
        if let Some(action) = metric
            .required_actions
            .iter()
            .find(|action| !action_ids.contains(action))
        {
            return Err(CatalogError::UnknownRequiredAction {
                metric: metric.id,
                action: *action,
            });
        }

        for dependency in &metric.depends_on {
            if !metric_ids.contains(dependency) {
                warn!(
                    metric_id = %metric.id,
                    dependency_id = %dependency,
                    "metric depends on a metric missing from the catalog; it will evaluate as absent"
                );
            }
        }
    }

    if let Some(path) = find_cycle(metrics) {
        return Err(CatalogError::DependencyCycle { path });
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Three-colour depth-first search over `depends_on`; returns the first cycle found,
/// closed by repeating its starting metric.
fn find_cycle(metrics: &[Metric]) -> Option<Vec<MetricId>> {
    let index: HashMap<MetricId, &Metric> =
        metrics.iter().map(|metric| (metric.id, metric)).collect();
    let mut marks = HashMap::new();
    let mut stack = Vec::new();

    metrics
        .iter()
        .find_map(|metric| visit(metric.id, &index, &mut marks, &mut stack))
}

fn visit(
    id: MetricId,
    index: &HashMap<MetricId, &Metric>,
    marks: &mut HashMap<MetricId, Mark>,
    stack: &mut Vec<MetricId>,
) -> Option<Vec<MetricId>> {
    match marks.get(&id) {
        Some(Mark::Done) => return None,
        Some(Mark::InProgress) => {
            let start = stack.iter().position(|entry| *entry == id).unwrap_or(0);
            let mut cycle = stack[start..].to_vec();
            cycle.push(id);
            return Some(cycle);
        }
        None => {}
    }

    let metric = index.get(&id)?;
    marks.insert(id, Mark::InProgress);
    stack.push(id);

    for dependency in &metric.depends_on {
        if let Some(cycle) = visit(*dependency, index, marks, stack) {
            return Some(cycle);
        }
    }

    stack.pop();
    marks.insert(id, Mark::Done);
    None
}
