use crate::infra::load_catalog;
use clap::Args;
use matchstats::config::AppConfig;
use matchstats::error::AppError;
use matchstats::stats::catalog::{load_document, sync, Catalog, CatalogSeed, SyncReport};
use matchstats::stats::{compute_metrics, ComputedMetricValue, MetricId, TallyImporter};
use serde_json::json;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogShowArgs {
    /// Print the catalog as a JSON document instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogCheckArgs {
    /// Catalog document (JSON) to validate
    #[arg(long)]
    pub(crate) path: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// CSV tally sheet with `action,count` columns
    #[arg(long)]
    pub(crate) counts: PathBuf,
    /// Metric id to compute (repeatable). Defaults to the whole catalog.
    #[arg(long)]
    pub(crate) metric: Vec<u32>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_catalog_show(args: CatalogShowArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let catalog = load_catalog(&config.catalog)?;

    if args.json {
        match serde_json::to_string_pretty(&catalog.to_document()) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Catalog document unavailable: {err}"),
        }
    } else {
        print!("{}", render_catalog(&catalog));
    }
    Ok(())
}

pub(crate) fn run_catalog_check(args: CatalogCheckArgs) -> Result<(), AppError> {
    let document = load_document(&args.path)?;
    println!("Catalog check: {}", args.path.display());

    match Catalog::from_document(document.clone()) {
        Ok(catalog) => println!(
            "- document is valid: {} actions, {} metrics",
            catalog.actions().len(),
            catalog.metrics().len()
        ),
        Err(err) => println!("- document does not load as-is: {err}"),
    }

    let outcome = sync(document, &CatalogSeed::standard())?;
    print!("{}", render_sync_report(&outcome.report));
    println!(
        "- after sync: {} actions, {} metrics",
        outcome.catalog.actions().len(),
        outcome.catalog.metrics().len()
    );
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        counts,
        metric,
        json,
    } = args;

    let config = AppConfig::load()?;
    let catalog = load_catalog(&config.catalog)?;
    let sheet = TallyImporter::from_path(&counts, &catalog)?;

    let selection: Vec<MetricId> = metric.into_iter().map(MetricId).collect();
    let selected = if selection.is_empty() {
        None
    } else {
        Some(selection.as_slice())
    };
    let values = compute_metrics(&catalog, selected, &sheet.counts);

    if json {
        let payload = json!({
            "counts": sheet.counts,
            "unknown_actions": sheet.unknown_actions,
            "metrics": values,
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Report payload unavailable: {err}"),
        }
        return Ok(());
    }

    println!("Metric report: {}", counts.display());
    print!("{}", render_metric_table(&values));
    if !sheet.unknown_actions.is_empty() {
        println!(
            "\nSkipped rows for unknown actions: {}",
            sheet.unknown_actions.join(", ")
        );
    }
    Ok(())
}

pub(crate) fn render_catalog(catalog: &Catalog) -> String {
    let mut out = String::from("Actions\n");
    for category in catalog.action_categories() {
        out.push_str(&format!("  {category}\n"));
        for action in catalog.actions_in_category(category) {
            out.push_str(&format!(
                "    [{:>3}] {:<28} {}\n",
                action.id.0, action.name, action.polarity
            ));
        }
    }

    out.push_str("\nMetrics\n");
    for metric in catalog.metrics() {
        out.push_str(&format!(
            "  [{:>3}] {:<28} {:<10}",
            metric.id.0,
            metric.name,
            metric.calculation.label()
        ));
        if !metric.depends_on.is_empty() {
            let dependencies: Vec<String> = metric
                .depends_on
                .iter()
                .map(|id| id.to_string())
                .collect();
            out.push_str(&format!(" depends on {}", dependencies.join(", ")));
        }
        out.push('\n');
    }

    out
}

pub(crate) fn render_metric_table(values: &[ComputedMetricValue]) -> String {
    if values.is_empty() {
        return "  no metrics computed\n".to_string();
    }

    let width = values
        .iter()
        .map(|value| value.metric_name.len())
        .max()
        .unwrap_or(0);
    values
        .iter()
        .map(|value| {
            format!(
                "  {:<width$}  {:>10.2}\n",
                value.metric_name,
                value.value,
                width = width
            )
        })
        .collect()
}

pub(crate) fn render_sync_report(report: &SyncReport) -> String {
    if report.is_clean() {
        return "- already in sync with the built-in seed\n".to_string();
    }

    let mut lines = Vec::new();
    for name in &report.actions_added {
        lines.push(format!("- add action '{name}'"));
    }
    for correction in &report.polarity_corrections {
        lines.push(format!(
            "- action {} '{}': polarity {} -> {}",
            correction.action_id, correction.name, correction.from, correction.to
        ));
    }
    for id in &report.duplicate_metrics_removed {
        lines.push(format!("- remove duplicate metric {id}"));
    }
    for name in &report.metrics_added {
        lines.push(format!("- add metric '{name}'"));
    }
    for name in &report.metrics_updated {
        lines.push(format!("- update metric '{name}'"));
    }
    for unresolved in &report.unresolved_references {
        lines.push(format!(
            "- metric '{}' references unknown '{}'",
            unresolved.metric, unresolved.reference
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
