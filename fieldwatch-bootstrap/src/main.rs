use anyhow::Result;
use clap::{Parser, Subcommand};

use fieldwatch_bootstrap::{execute, Action};
use fieldwatch_domain::AlertQuery;
use fieldwatch_infrastructure::CONFIG_ENV;

#[derive(Parser, Debug)]
#[command(name = "fieldwatch")]
#[command(about = "Technician activity audit: CSV ingestion and business rules", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest the feeds and evaluate the rules once
    Run,
    /// Run the audit every day at the configured time
    Schedule,
    /// Mark an alert as resolved
    Resolve {
        id: String,
        #[arg(long)]
        by: Option<String>,
    },
    /// Mark an alert as a false positive
    FalsePositive {
        id: String,
        #[arg(long)]
        by: Option<String>,
    },
    /// List stored alerts, newest first
    Alerts {
        #[arg(long)]
        technician: Option<String>,
        #[arg(long)]
        unresolved: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Ask the enrichment service about an alert
    Enrich { id: String },
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        match command {
            Command::Run => Action::Run,
            Command::Schedule => Action::Schedule,
            Command::Resolve { id, by } => Action::Resolve { id, by },
            Command::FalsePositive { id, by } => Action::FalsePositive { id, by },
            Command::Alerts {
                technician,
                unresolved,
                limit,
            } => Action::Alerts {
                query: AlertQuery {
                    technician,
                    category: None,
                    unresolved_only: unresolved,
                    limit,
                },
            },
            Command::Enrich { id } => Action::Enrich { id },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so command output on stdout stays parseable.
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .init();
    }

    if let Some(config) = args.config {
        std::env::set_var(CONFIG_ENV, config);
    }

    execute(args.command.into()).await
}
