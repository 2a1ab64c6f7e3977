use crate::stats::domain::{ActionId, Polarity};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionTally {
    pub action_id: ActionId,
    pub name: String,
    pub polarity: Polarity,
    pub count: u64,
}

/// Counts for one action category, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub total: u64,
    pub actions: Vec<ActionTally>,
}
