use super::catalog::Catalog;
use super::domain::{
    ActionCounts, ActionId, CalculationKind, ComputedMetricValue, Metric, MetricId,
};
use super::resolver::resolve_dependencies;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Evaluates metrics against raw counts for a single catalog snapshot.
///
/// The engine owns no state between calls; the running table of computed values
/// lives only for the duration of one [`MetricEngine::evaluate`].
pub struct MetricEngine<'a> {
    catalog: &'a Catalog,
}

impl<'a> MetricEngine<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Folds over `ordered` (normally the output of [`resolve_dependencies`]) so later
    /// metrics can read the unrounded values of earlier ones. Unknown ids and ids
    /// already evaluated are skipped; a metric that fails is logged and left out.
    pub fn evaluate(
        &self,
        ordered: &[MetricId],
        counts: &ActionCounts,
    ) -> Vec<ComputedMetricValue> {
        let mut computed: HashMap<MetricId, f64> = HashMap::with_capacity(ordered.len());
        let mut results = Vec::with_capacity(ordered.len());

        for id in ordered {
            if computed.contains_key(id) {
                continue;
            }

            let Some(metric) = self.catalog.metric(*id) else {
                debug!(metric_id = %id, "skipping metric missing from catalog");
                continue;
            };

            match self.evaluate_metric(metric, counts, &computed) {
                Ok(value) => {
                    computed.insert(metric.id, value);
                    results.push(ComputedMetricValue {
                        metric_id: metric.id,
                        metric_name: metric.name.clone(),
                        value: round_to_hundredths(value),
                        formula: metric.formula.clone(),
                    });
                }
                Err(error) => {
                    warn!(metric_id = %metric.id, metric = %metric.name, %error, "skipping metric");
                }
            }
        }

        results
    }

    /// Unrounded value of one metric. Non-finite results are coerced to zero.
    pub fn evaluate_metric(
        &self,
        metric: &Metric,
        counts: &ActionCounts,
        computed: &HashMap<MetricId, f64>,
    ) -> Result<f64, MetricEvaluationError> {
        let value = match metric.calculation {
            CalculationKind::Sum => self.sum(metric, counts)?,
            CalculationKind::Percentage => self.percentage(metric, counts, computed)?,
            CalculationKind::Custom => self.custom(metric, counts)?,
        };

        Ok(if value.is_finite() { value } else { 0.0 })
    }

    fn sum(&self, metric: &Metric, counts: &ActionCounts) -> Result<f64, MetricEvaluationError> {
        Ok(total(metric, counts, |_| true)? as f64)
    }

    fn custom(&self, metric: &Metric, counts: &ActionCounts) -> Result<f64, MetricEvaluationError> {
        self.sum(metric, counts)
    }

    fn percentage(
        &self,
        metric: &Metric,
        counts: &ActionCounts,
        computed: &HashMap<MetricId, f64>,
    ) -> Result<f64, MetricEvaluationError> {
        let successful = total(metric, counts, |action| {
            self.catalog
                .action(action)
                .is_some_and(|action| action.polarity.counts_as_success())
        })?;

        let denominator = match metric.depends_on.first() {
            Some(dependency) => computed.get(dependency).copied().unwrap_or(0.0),
            None => total(metric, counts, |_| true)? as f64,
        };

        if denominator == 0.0 || !denominator.is_finite() {
            return Ok(0.0);
        }

        Ok(successful as f64 / denominator * 100.0)
    }
}

fn total(
    metric: &Metric,
    counts: &ActionCounts,
    include: impl Fn(ActionId) -> bool,
) -> Result<u64, MetricEvaluationError> {
    metric
        .required_actions
        .iter()
        .filter(|action| include(**action))
        .try_fold(0u64, |sum, action| {
            sum.checked_add(counts.get(*action))
                .ok_or(MetricEvaluationError::CountOverflow { metric: metric.id })
        })
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Resolves `selected` (or the whole catalog when `None`) and evaluates it.
pub fn compute_metrics(
    catalog: &Catalog,
    selected: Option<&[MetricId]>,
    counts: &ActionCounts,
) -> Vec<ComputedMetricValue> {
    let ordered = match selected {
        Some(ids) => resolve_dependencies(catalog, ids),
        None => resolve_dependencies(catalog, &catalog.metric_ids()),
    };

    MetricEngine::new(catalog).evaluate(&ordered, counts)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricEvaluationError {
    #[error("action counts for metric {metric} overflow a 64-bit total")]
    CountOverflow { metric: MetricId },
}
