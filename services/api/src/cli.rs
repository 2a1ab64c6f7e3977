use crate::commands::{
    run_catalog_check, run_catalog_show, run_report, CatalogCheckArgs, CatalogShowArgs,
    ReportArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use matchstats::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "matchstats",
    about = "Track in-game athlete actions and compute performance metrics",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect or validate action/metric catalogs
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Compute metrics for a CSV tally sheet
    Report(ReportArgs),
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Print the catalog the service would load
    Show(CatalogShowArgs),
    /// Validate a catalog document and preview what syncing with the seed changes
    Check(CatalogCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Catalog {
            command: CatalogCommand::Show(args),
        } => run_catalog_show(args),
        Command::Catalog {
            command: CatalogCommand::Check(args),
        } => run_catalog_check(args),
        Command::Report(args) => run_report(args),
    }
}
