use super::super::domain::{Action, ActionId, CalculationKind, Metric, MetricId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// On-disk catalog layout. Field aliases accept exports from the earlier
/// camelCase schema (`metricFormula`, `calculationType`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub metrics: Vec<MetricDefinition>,
}

/// Metric as written in a catalog document, before its calculation kind is checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: MetricId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "metricFormula")]
    pub formula: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_calculation", alias = "calculationType")]
    pub calculation: String,
    #[serde(default, alias = "requiredActions")]
    pub required_actions: Vec<ActionId>,
    #[serde(default, alias = "dependsOn")]
    pub depends_on: Vec<MetricId>,
}

fn default_calculation() -> String {
    CalculationKind::Custom.label().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricDefinitionError {
    #[error("metric {metric} ('{name}') uses unsupported calculation kind '{kind}'")]
    UnsupportedCalculation {
        metric: MetricId,
        name: String,
        kind: String,
    },
}

impl TryFrom<MetricDefinition> for Metric {
    type Error = MetricDefinitionError;

    fn try_from(definition: MetricDefinition) -> Result<Self, Self::Error> {
        let calculation = CalculationKind::parse(&definition.calculation).ok_or_else(|| {
            MetricDefinitionError::UnsupportedCalculation {
                metric: definition.id,
                name: definition.name.clone(),
                kind: definition.calculation.clone(),
            }
        })?;

        Ok(Metric {
            id: definition.id,
            name: definition.name,
            description: definition.description,
            formula: definition.formula,
            category: definition.category,
            calculation,
            required_actions: dedup_preserving_order(definition.required_actions),
            depends_on: dedup_preserving_order(definition.depends_on),
        })
    }
}

impl From<&Metric> for MetricDefinition {
    fn from(metric: &Metric) -> Self {
        Self {
            id: metric.id,
            name: metric.name.clone(),
            description: metric.description.clone(),
            formula: metric.formula.clone(),
            category: metric.category.clone(),
            calculation: metric.calculation.label().to_string(),
            required_actions: metric.required_actions.clone(),
            depends_on: metric.depends_on.clone(),
        }
    }
}

/// Converts definitions into metrics, dropping (and logging) malformed entries.
pub(crate) fn accept_definitions(definitions: Vec<MetricDefinition>) -> Vec<Metric> {
    definitions
        .into_iter()
        .filter_map(|definition| match Metric::try_from(definition) {
            Ok(metric) => Some(metric),
            Err(error) => {
                warn!(%error, "skipping malformed metric definition");
                None
            }
        })
        .collect()
}

fn dedup_preserving_order<T: PartialEq + Copy>(values: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_field_names_are_accepted() {
        let definition: MetricDefinition = serde_json::from_str(
            r#"{
                "id": 3,
                "name": "Pass Completion Rate",
                "metricFormula": "(Complete Pass + Pass Forward) / Total Passes",
                "category": "Passing",
                "calculationType": "percentage",
                "requiredActions": [5, 6, 5],
                "dependsOn": [2]
            }"#,
        )
        .expect("legacy definition parses");

        let metric = Metric::try_from(definition).expect("supported kind");
        assert_eq!(metric.calculation, CalculationKind::Percentage);
        assert_eq!(metric.required_actions, vec![ActionId(5), ActionId(6)]);
        assert_eq!(metric.depends_on, vec![MetricId(2)]);
    }

    #[test]
    fn missing_calculation_falls_back_to_custom() {
        let definition: MetricDefinition =
            serde_json::from_str(r#"{"id": 9, "name": "Touches"}"#).expect("parses");
        let metric = Metric::try_from(definition).expect("custom is supported");
        assert_eq!(metric.calculation, CalculationKind::Custom);
    }

    #[test]
    fn unsupported_calculation_is_rejected_and_skipped() {
        let definitions: Vec<MetricDefinition> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Average Rating", "calculation": "average"},
                {"id": 2, "name": "Total Passes", "calculation": "sum"}
            ]"#,
        )
        .expect("parses");

        let error = Metric::try_from(definitions[0].clone()).expect_err("average unsupported");
        assert!(error.to_string().contains("average"));

        let accepted = accept_definitions(definitions);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].name, "Total Passes");
    }
}
