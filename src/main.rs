use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use splitbook::application::balance::BalanceEngine;
use splitbook::application::ledger::LedgerService;
use splitbook::domain::expense::ExpenseId;
use splitbook::domain::period::Window;
use splitbook::domain::ports::LedgerStores;
#[cfg(feature = "storage-rocksdb")]
use splitbook::infrastructure::rocksdb::RocksDBStore;
use splitbook::interfaces::csv::balance_writer::BalanceWriter;
use splitbook::interfaces::csv::importer::LedgerImporter;
use splitbook::logging;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory with settings.csv, expenses.csv, installments.csv,
    /// transfers.csv and fixed_expenses.csv to load before running.
    /// Rows already present in the --db-path database are left as stored.
    #[arg(long, env = "SPLITBOOK_LEDGER")]
    ledger: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "SPLITBOOK_DB_PATH")]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show who owes whom, for one month or for all time
    Balance {
        /// Month (1-12) to restrict the balance to
        #[arg(long, requires = "year")]
        month: Option<u32>,

        /// Year of the month to restrict the balance to
        #[arg(long, requires = "month")]
        year: Option<i32>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
    /// Show payment progress of an installment expense as JSON
    Installments { expense_id: ExpenseId },
    /// Print the sum of all fixed expenses
    FixedTotal,
    /// Print the split configuration as JSON
    Settings,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    let stores = Arc::new(open_stores(cli.db_path.as_deref())?);
    let ledger = LedgerService::new(Arc::clone(&stores));

    if let Some(dir) = &cli.ledger {
        let summary = LedgerImporter::new(&ledger).import_dir(dir).await?;
        if summary.skipped > 0 {
            warn!(skipped = summary.skipped, "some ledger rows were rejected");
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Balance {
            month,
            year,
            format,
        } => {
            let window = match (month, year) {
                (Some(month), Some(year)) => Some(Window::new(month, year)?),
                _ => None,
            };
            let balance = BalanceEngine::new(stores).compute_balance(window).await?;
            match format {
                OutputFormat::Csv => BalanceWriter::new(&mut out).write_balance(&balance)?,
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(&mut out, &balance).into_diagnostic()?;
                    writeln!(out).into_diagnostic()?;
                }
            }
        }
        Command::Installments { expense_id } => {
            let status = ledger.installment_status(expense_id).await?;
            serde_json::to_writer_pretty(&mut out, &status).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
        Command::FixedTotal => {
            let total = ledger.fixed_expenses_total().await?;
            writeln!(out, "{}", total.normalize()).into_diagnostic()?;
        }
        Command::Settings => {
            let config = ledger.settings().await?;
            let view = serde_json::json!({
                "person1_name": config.person1_name,
                "person2_name": config.person2_name,
                "person1_percentage": config.person1_percentage,
                "person2_percentage": config.person2_percentage(),
            });
            serde_json::to_writer_pretty(&mut out, &view).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
    }

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<&Path>) -> Result<LedgerStores> {
    match db_path {
        Some(path) => {
            info!(path = %path.display(), "using RocksDB storage");
            Ok(RocksDBStore::open(path)?.into_ledger_stores())
        }
        None => Ok(LedgerStores::in_memory()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<&Path>) -> Result<LedgerStores> {
    if let Some(path) = db_path {
        warn!(
            path = %path.display(),
            "persistent storage requested via --db-path, but the storage-rocksdb feature is not enabled; falling back to in-memory storage"
        );
    } else {
        info!("using in-memory storage");
    }
    Ok(LedgerStores::in_memory())
}
