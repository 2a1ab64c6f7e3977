use matchstats::stats::{
    compute_metrics, required_actions_for, resolve_dependencies, ActionCounts, ActionId,
    Catalog, CatalogSeed, ComputedMetricValue, MetricEngine, MetricId,
};
use std::io::Cursor;

fn standard() -> Catalog {
    CatalogSeed::standard()
        .into_catalog()
        .expect("seed catalog is valid")
}

fn counts(pairs: &[(u32, u64)]) -> ActionCounts {
    pairs
        .iter()
        .map(|(action, count)| (ActionId(*action), *count))
        .collect()
}

fn value_of(values: &[ComputedMetricValue], id: u32) -> Option<f64> {
    values
        .iter()
        .find(|value| value.metric_id == MetricId(id))
        .map(|value| value.value)
}

const SCENARIO_CATALOG: &str = r#"{
    "actions": [
        {"id": 1, "name": "Goal", "category": "Shooting", "polarity": "success"},
        {"id": 2, "name": "Miss", "category": "Shooting", "polarity": "failure"},
        {"id": 3, "name": "Complete Pass", "category": "Passing", "polarity": "success"},
        {"id": 4, "name": "Risky Pass", "category": "Passing", "polarity": "partial-success"},
        {"id": 5, "name": "Lost Pass", "category": "Passing", "polarity": "failure"}
    ],
    "metrics": [
        {"id": 1, "name": "Attempts", "category": "Shooting", "calculation": "sum",
         "required_actions": [1, 2]},
        {"id": 2, "name": "Accuracy", "category": "Shooting", "calculation": "percentage",
         "required_actions": [1, 2]},
        {"id": 3, "name": "Passes", "category": "Passing", "calculation": "sum",
         "required_actions": [3, 4, 5]},
        {"id": 4, "name": "Completion", "category": "Passing", "calculation": "percentage",
         "required_actions": [3, 4, 5], "depends_on": [3]}
    ]
}"#;

#[test]
fn scenarios_against_a_document_catalog() {
    let catalog = Catalog::from_reader(Cursor::new(SCENARIO_CATALOG)).expect("catalog loads");

    let sum = compute_metrics(&catalog, Some(&[MetricId(1)]), &counts(&[(1, 3), (2, 4)]));
    assert_eq!(value_of(&sum, 1), Some(7.0));

    let accuracy = compute_metrics(&catalog, Some(&[MetricId(2)]), &counts(&[(1, 8), (2, 2)]));
    assert_eq!(value_of(&accuracy, 2), Some(80.0));

    let completion = compute_metrics(
        &catalog,
        Some(&[MetricId(4)]),
        &counts(&[(3, 5), (4, 2), (5, 3)]),
    );
    assert_eq!(value_of(&completion, 3), Some(10.0));
    assert_eq!(value_of(&completion, 4), Some(70.0));

    let empty = compute_metrics(&catalog, None, &ActionCounts::new());
    assert_eq!(empty.len(), 4);
    assert!(empty.iter().all(|value| value.value == 0.0));

    assert!(resolve_dependencies(&catalog, &[MetricId(999)]).is_empty());
}

#[test]
fn resolved_order_puts_dependencies_first() {
    let catalog = standard();
    let ordered = resolve_dependencies(&catalog, &catalog.metric_ids());

    for (position, id) in ordered.iter().enumerate() {
        let metric = catalog.metric(*id).expect("resolved ids exist");
        for dependency in &metric.depends_on {
            let dependency_position = ordered
                .iter()
                .position(|candidate| candidate == dependency)
                .expect("dependency resolved");
            assert!(dependency_position < position);
        }
    }
    assert_eq!(ordered.len(), catalog.metrics().len());
}

#[test]
fn required_actions_cover_every_selected_metric() {
    let catalog = standard();
    let selection = [MetricId(3), MetricId(5)];
    let required = required_actions_for(&catalog, &selection);

    for id in selection {
        let metric = catalog.metric(id).expect("metric exists");
        assert!(metric
            .required_actions
            .iter()
            .all(|action| required.contains(action)));
    }
    assert_eq!(required.len(), 6);
}

#[test]
fn repeated_evaluation_is_stable() {
    let catalog = standard();
    let engine = MetricEngine::new(&catalog);
    let ordered = resolve_dependencies(&catalog, &catalog.metric_ids());
    let sample = counts(&[(1, 2), (2, 1), (5, 9), (6, 2), (7, 3), (9, 1), (10, 3)]);

    let first = engine.evaluate(&ordered, &sample);
    let second = engine.evaluate(&ordered, &sample);
    assert_eq!(first, second);
    assert_eq!(value_of(&first, 1), Some(66.67));
    assert_eq!(value_of(&first, 5), Some(25.0));
}
