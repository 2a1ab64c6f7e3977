use super::super::domain::{CalculationKind, Polarity};
use super::{sync, Catalog, CatalogDocument, CatalogError};

#[derive(Debug, Clone)]
pub struct SeedAction {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub polarity: Polarity,
}

/// Seed metrics reference actions and other metrics by name; ids are assigned when
/// the seed is materialised or synced into an existing catalog.
#[derive(Debug, Clone)]
pub struct SeedMetric {
    pub name: &'static str,
    pub description: &'static str,
    pub formula: &'static str,
    pub category: &'static str,
    pub calculation: CalculationKind,
    pub required_actions: Vec<&'static str>,
    pub depends_on: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct CatalogSeed {
    actions: Vec<SeedAction>,
    metrics: Vec<SeedMetric>,
}

impl CatalogSeed {
    pub fn standard() -> Self {
        Self {
            actions: standard_actions(),
            metrics: standard_metrics(),
        }
    }

    pub fn new(actions: Vec<SeedAction>, metrics: Vec<SeedMetric>) -> Self {
        Self { actions, metrics }
    }

    pub fn actions(&self) -> &[SeedAction] {
        &self.actions
    }

    pub fn metrics(&self) -> &[SeedMetric] {
        &self.metrics
    }

    /// Fresh catalog with ids assigned in declaration order, starting at 1.
    pub fn into_catalog(&self) -> Result<Catalog, CatalogError> {
        sync(CatalogDocument::default(), self).map(|outcome| outcome.catalog)
    }
}

fn standard_actions() -> Vec<SeedAction> {
    vec![
        SeedAction {
            name: "Shot on Target",
            description: "Shot that hits the target/goal",
            category: "Shooting",
            polarity: Polarity::Success,
        },
        SeedAction {
            name: "Shot off Target",
            description: "Shot that misses the target/goal",
            category: "Shooting",
            polarity: Polarity::Failure,
        },
        SeedAction {
            name: "Successful Dribble",
            description: "Successfully dribbled past an opponent",
            category: "Dribbling",
            polarity: Polarity::Success,
        },
        SeedAction {
            name: "Unsuccessful Dribble",
            description: "Failed to dribble past an opponent",
            category: "Dribbling",
            polarity: Polarity::Failure,
        },
        SeedAction {
            name: "Complete Pass",
            description: "Successfully completed pass to teammate",
            category: "Passing",
            polarity: Polarity::Success,
        },
        SeedAction {
            name: "Incomplete Pass",
            description: "Pass that was intercepted or missed",
            category: "Passing",
            polarity: Polarity::Failure,
        },
        SeedAction {
            name: "Pass Forward",
            description: "Forward pass to advance the ball",
            category: "Passing",
            polarity: Polarity::PartialSuccess,
        },
        SeedAction {
            name: "Line-breaking Pass",
            description: "Pass that breaks through defensive lines",
            category: "Passing",
            polarity: Polarity::PartialSuccess,
        },
        SeedAction {
            name: "Successful Tackle",
            description: "Successfully won the ball from opponent",
            category: "Defending",
            polarity: Polarity::Success,
        },
        SeedAction {
            name: "Missed Tackle",
            description: "Failed attempt to win the ball",
            category: "Defending",
            polarity: Polarity::Failure,
        },
        SeedAction {
            name: "Successful Interception",
            description: "Successfully intercepted opponent pass",
            category: "Defending",
            polarity: Polarity::Success,
        },
        SeedAction {
            name: "Progressive Carry",
            description: "Carried ball forward into advanced position",
            category: "Possession",
            polarity: Polarity::Neutral,
        },
        SeedAction {
            name: "Cross into the Box",
            description: "Crossed ball into the penalty area",
            category: "Possession",
            polarity: Polarity::Neutral,
        },
    ]
}

fn standard_metrics() -> Vec<SeedMetric> {
    const PASSES: [&str; 4] = [
        "Complete Pass",
        "Incomplete Pass",
        "Pass Forward",
        "Line-breaking Pass",
    ];

    vec![
        SeedMetric {
            name: "Shots on Target %",
            description: "Percentage of shots that hit the target",
            formula: "Shot on Target / (Shot on Target + Shot off Target)",
            category: "Shooting",
            calculation: CalculationKind::Percentage,
            required_actions: vec!["Shot on Target", "Shot off Target"],
            depends_on: Vec::new(),
        },
        SeedMetric {
            name: "Total Passes",
            description: "Total number of passes attempted",
            formula: "Complete Pass + Incomplete Pass + Pass Forward + Line-breaking Pass",
            category: "Passing",
            calculation: CalculationKind::Sum,
            required_actions: PASSES.to_vec(),
            depends_on: Vec::new(),
        },
        SeedMetric {
            name: "Pass Completion Rate",
            description: "Percentage of successful passes",
            formula: "(Complete Pass + Pass Forward + Line-breaking Pass) / Total Passes",
            category: "Passing",
            calculation: CalculationKind::Percentage,
            required_actions: PASSES.to_vec(),
            depends_on: vec!["Total Passes"],
        },
        SeedMetric {
            name: "Dribble Success Rate",
            description: "Percentage of successful dribbles",
            formula: "Successful Dribble / (Successful Dribble + Unsuccessful Dribble)",
            category: "Dribbling",
            calculation: CalculationKind::Percentage,
            required_actions: vec!["Successful Dribble", "Unsuccessful Dribble"],
            depends_on: Vec::new(),
        },
        SeedMetric {
            name: "Successful Tackle Rate",
            description: "Percentage of successful tackles",
            formula: "Successful Tackle / (Successful Tackle + Missed Tackle)",
            category: "Defending",
            calculation: CalculationKind::Percentage,
            required_actions: vec!["Successful Tackle", "Missed Tackle"],
            depends_on: Vec::new(),
        },
        SeedMetric {
            name: "Possession",
            description: "Total possession actions",
            formula: "Complete Pass + Incomplete Pass + Successful Dribble + Unsuccessful Dribble",
            category: "Possession",
            calculation: CalculationKind::Sum,
            required_actions: vec![
                "Complete Pass",
                "Incomplete Pass",
                "Successful Dribble",
                "Unsuccessful Dribble",
            ],
            depends_on: Vec::new(),
        },
    ]
}
