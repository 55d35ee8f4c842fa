mod batch;
mod bootstrap;
mod config;
mod error;
mod execution;
mod funding;
mod ledger;
mod monitor;
mod report;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::batch::BatchOrchestrator;
use crate::config::{BatchFile, Config};
use crate::ledger::models::parse_amount;
use crate::report::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "stellar-ops",
    about = "Account monitoring and sequential payment batches on a Stellar network",
    version
)]
struct Cli {
    /// Configuration file (TOML); environment variables override it
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report format written to stdout
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report native balance, trustlines and sequence for accounts
    Monitor {
        /// Accounts to inspect; defaults to PUBLIC_KEY and MONITORED_ACCOUNTS
        #[arg(value_name = "ACCOUNT")]
        accounts: Vec<String>,
    },
    /// Send a fixed amount to each recipient of a batch file, stopping on the first failure
    Pay {
        /// Batch file listing the amount and the recipients
        #[arg(long, value_name = "FILE")]
        batch: PathBuf,

        /// Override the amount from the batch file
        #[arg(long)]
        amount: Option<String>,
    },
    /// Generate new keypairs, optionally funding them through Friendbot
    Keygen {
        #[arg(long, default_value_t = 1)]
        count: usize,

        #[arg(long)]
        fund: bool,
    },
}

// Initialize logging and tracing. Logs go to stderr, reports to stdout.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,stellar_ops=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Monitor { accounts } => run_monitor(&config, accounts, cli.format).await,
        Command::Pay { batch, amount } => run_payments(&config, &batch, amount, cli.format).await,
        Command::Keygen { count, fund } => run_keygen(&config, count, fund, cli.format).await,
    }
}

async fn run_monitor(
    config: &Config,
    accounts: Vec<String>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let accounts = if accounts.is_empty() {
        config.monitored()
    } else {
        accounts
    };
    if accounts.is_empty() {
        anyhow::bail!(
            "No accounts to monitor: pass them as arguments or set PUBLIC_KEY / MONITORED_ACCOUNTS"
        );
    }

    let client = bootstrap::initialize_ledger_client(config)?;
    let monitor = bootstrap::initialize_monitor(client);

    let report = monitor.run(&accounts).await;
    report::render_monitor(&report, format, &mut io::stdout().lock())?;

    Ok(())
}

async fn run_payments(
    config: &Config,
    batch_path: &std::path::Path,
    amount: Option<String>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let batch = BatchFile::load(batch_path)
        .with_context(|| format!("Failed to read batch file {}", batch_path.display()))?;
    let amount = parse_amount(amount.as_deref().unwrap_or(&batch.amount))?;
    let instructions =
        BatchOrchestrator::plan(amount, &batch.entries()).context("Invalid payment batch")?;

    let client = bootstrap::initialize_ledger_client(config)?;
    let orchestrator = bootstrap::initialize_orchestrator(config, client)?;

    let report = orchestrator.run(&instructions).await;
    report::render_batch(&report, format, &mut io::stdout().lock())?;

    let sent = report.outcomes.iter().filter(|o| o.is_success()).count();
    if report.is_completed() {
        info!("Batch {} finished: {}/{} payments sent", report.run_id, sent, report.total);
    } else {
        warn!("Batch {} interrupted: {}/{} payments sent", report.run_id, sent, report.total);
    }

    Ok(())
}

async fn run_keygen(
    config: &Config,
    count: usize,
    fund: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let faucet = if fund {
        Some(bootstrap::initialize_faucet(config)?)
    } else {
        None
    };

    let faucet = faucet.as_ref().map(|f| f as &dyn funding::Faucet);
    let accounts = funding::create_accounts(count, faucet).await;
    report::render_accounts(&accounts, format, &mut io::stdout().lock())?;

    Ok(())
}
