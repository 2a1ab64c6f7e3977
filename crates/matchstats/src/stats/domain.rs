use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identity of a countable in-game event type. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(pub u32);

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an action's occurrences land on the successful side of a percentage.
///
/// Older catalogs stored this as a colour label, so those spellings are still accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    #[serde(alias = "green")]
    Success,
    #[serde(alias = "light green", alias = "partial_success")]
    PartialSuccess,
    #[serde(alias = "light red", alias = "partial_failure")]
    PartialFailure,
    #[serde(alias = "red")]
    Failure,
    #[default]
    Neutral,
}

impl Polarity {
    pub const fn counts_as_success(self) -> bool {
        matches!(self, Self::Success | Self::PartialSuccess)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial-success",
            Self::PartialFailure => "partial-failure",
            Self::Failure => "failure",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Formula family a metric is computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationKind {
    Sum,
    Percentage,
    Custom,
}

impl CalculationKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "percentage" => Some(Self::Percentage),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Percentage => "percentage",
            Self::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default, alias = "color")]
    pub polarity: Polarity,
}

/// Derived statistic. `depends_on` lists metrics whose computed value this one reads;
/// only the first entry is consumed today (as a percentage denominator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub id: MetricId,
    pub name: String,
    pub description: String,
    pub formula: String,
    pub category: String,
    pub calculation: CalculationKind,
    pub required_actions: Vec<ActionId>,
    pub depends_on: Vec<MetricId>,
}

/// Recorded occurrence count of one action within one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawActionCount {
    pub game_id: GameId,
    pub action_id: ActionId,
    pub count: u64,
    pub updated_at: DateTime<Utc>,
}

/// Sparse per-action counters for a single game. Absent entries read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionCounts(BTreeMap<ActionId, u64>);

impl ActionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[RawActionCount]) -> Self {
        records
            .iter()
            .map(|record| (record.action_id, record.count))
            .collect()
    }

    pub fn get(&self, action: ActionId) -> u64 {
        self.0.get(&action).copied().unwrap_or(0)
    }

    pub fn set(&mut self, action: ActionId, count: u64) {
        self.0.insert(action, count);
    }

    pub fn add(&mut self, action: ActionId, count: u64) {
        let entry = self.0.entry(action).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionId, u64)> + '_ {
        self.0.iter().map(|(action, count)| (*action, *count))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ActionId, u64)> for ActionCounts {
    fn from_iter<I: IntoIterator<Item = (ActionId, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ephemeral evaluation result; `value` is rounded to two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedMetricValue {
    pub metric_id: MetricId,
    pub metric_name: String,
    pub value: f64,
    pub formula: String,
}
