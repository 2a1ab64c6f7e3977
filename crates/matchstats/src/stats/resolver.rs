use super::catalog::Catalog;
use super::domain::{ActionId, MetricId};
use std::collections::{BTreeSet, HashSet};

/// Orders `selected` so every metric follows the metrics it depends on.
///
/// Depth-first post-order over `depends_on`: each id appears once, in the order its
/// traversal completed. Unknown ids are skipped. A metric that is already being
/// visited is never re-entered, which keeps a cyclic graph from recursing forever
/// (catalog validation rejects cycles before they get here).
pub fn resolve_dependencies(catalog: &Catalog, selected: &[MetricId]) -> Vec<MetricId> {
    let mut resolved = Vec::new();
    let mut visited = HashSet::new();

    for id in selected {
        visit(catalog, *id, &mut visited, &mut resolved);
    }

    resolved
}

fn visit(
    catalog: &Catalog,
    id: MetricId,
    visited: &mut HashSet<MetricId>,
    resolved: &mut Vec<MetricId>,
) {
    if !visited.insert(id) {
        return;
    }

    let Some(metric) = catalog.metric(id) else {
        return;
    };

    for dependency in &metric.depends_on {
        visit(catalog, *dependency, visited, resolved);
    }

    resolved.push(id);
}

/// Union of the actions the given metrics read. Unknown metric ids contribute nothing.
pub fn required_actions_for(catalog: &Catalog, metric_ids: &[MetricId]) -> BTreeSet<ActionId> {
    metric_ids
        .iter()
        .filter_map(|id| catalog.metric(*id))
        .flat_map(|metric| metric.required_actions.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::catalog::CatalogSeed;
    use crate::stats::domain::{Action, CalculationKind, Metric, Polarity};

    fn standard() -> Catalog {
        CatalogSeed::standard()
            .into_catalog()
            .expect("seed catalog is valid")
    }

    fn metric(id: u32, depends_on: &[u32]) -> Metric {
        Metric {
            id: MetricId(id),
            name: format!("metric-{id}"),
            description: String::new(),
            formula: String::new(),
            category: "Test".to_string(),
            calculation: CalculationKind::Sum,
            required_actions: Vec::new(),
            depends_on: depends_on.iter().copied().map(MetricId).collect(),
        }
    }

    #[test]
    fn dependency_precedes_dependent() {
        let catalog = standard();
        let ordered = resolve_dependencies(&catalog, &[MetricId(3)]);
        assert_eq!(ordered, vec![MetricId(2), MetricId(3)]);
    }

    #[test]
    fn duplicates_and_already_resolved_dependencies_appear_once() {
        let catalog = standard();
        let ordered = resolve_dependencies(
            &catalog,
            &[MetricId(1), MetricId(3), MetricId(2), MetricId(1)],
        );
        assert_eq!(ordered, vec![MetricId(1), MetricId(2), MetricId(3)]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let catalog = standard();
        assert!(resolve_dependencies(&catalog, &[MetricId(999)]).is_empty());
        assert_eq!(
            resolve_dependencies(&catalog, &[MetricId(999), MetricId(4)]),
            vec![MetricId(4)]
        );
    }

    #[test]
    fn transitive_chains_resolve_bottom_up() {
        let catalog = Catalog::assemble(
            Vec::new(),
            vec![metric(1, &[2]), metric(2, &[3]), metric(3, &[]), metric(4, &[1, 3])],
        );
        assert_eq!(
            resolve_dependencies(&catalog, &[MetricId(4)]),
            vec![MetricId(3), MetricId(2), MetricId(1), MetricId(4)]
        );
    }

    #[test]
    fn cyclic_graph_terminates_with_partial_order() {
        let catalog = Catalog::assemble(Vec::new(), vec![metric(1, &[2]), metric(2, &[1])]);
        assert_eq!(
            resolve_dependencies(&catalog, &[MetricId(1)]),
            vec![MetricId(2), MetricId(1)]
        );
    }

    #[test]
    fn required_actions_is_the_union() {
        let catalog = standard();
        let shooting = &catalog.metric(MetricId(1)).expect("metric 1").required_actions;
        let possession = &catalog.metric(MetricId(6)).expect("metric 6").required_actions;

        let union = required_actions_for(&catalog, &[MetricId(1), MetricId(6), MetricId(42)]);
        let expected: BTreeSet<ActionId> =
            shooting.iter().chain(possession.iter()).copied().collect();
        assert_eq!(union, expected);
        assert_eq!(union.len(), 6);
    }

    #[test]
    fn required_actions_for_nothing_is_empty() {
        let catalog = Catalog::assemble(
            vec![Action {
                id: ActionId(1),
                name: "Touch".to_string(),
                description: String::new(),
                category: "Possession".to_string(),
                polarity: Polarity::Neutral,
            }],
            Vec::new(),
        );
        assert!(required_actions_for(&catalog, &[]).is_empty());
        assert!(required_actions_for(&catalog, &[MetricId(1)]).is_empty());
    }
}
