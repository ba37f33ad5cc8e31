use super::record_reader::RecordReader;
use crate::application::ledger::LedgerService;
use crate::domain::expense::{Expense, InstallmentPayment};
use crate::domain::fixed_expense::FixedExpense;
use crate::domain::settings::SplitConfig;
use crate::domain::transfer::Transfer;
use crate::error::{LedgerError, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::future::Future;
use std::path::Path;
use tracing::{debug, info, warn};

pub const SETTINGS_FILE: &str = "settings.csv";
pub const EXPENSES_FILE: &str = "expenses.csv";
pub const INSTALLMENTS_FILE: &str = "installments.csv";
pub const TRANSFERS_FILE: &str = "transfers.csv";
pub const FIXED_EXPENSES_FILE: &str = "fixed_expenses.csv";

/// Rows accepted and rejected during an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    /// Rows whose id was already stored, e.g. from an earlier import into the
    /// same database.
    pub existing: usize,
}

impl ImportSummary {
    fn merge(&mut self, other: ImportSummary) {
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.existing += other.existing;
    }
}

/// Loads a ledger directory into the stores through [`LedgerService`].
///
/// Files are optional and read in dependency order, so installment rows can
/// refer to expenses from the same directory. Rows that fail to parse or are
/// rejected by the service are logged and skipped. Rows whose id is already
/// stored are left untouched, so importing the same directory into a
/// persistent store again is a no-op.
pub struct LedgerImporter<'a> {
    ledger: &'a LedgerService,
}

impl<'a> LedgerImporter<'a> {
    pub fn new(ledger: &'a LedgerService) -> Self {
        Self { ledger }
    }

    pub async fn import_dir(&self, dir: &Path) -> Result<ImportSummary> {
        let ledger = self.ledger;
        let mut summary = ImportSummary::default();

        summary.merge(
            self.import_file(&dir.join(SETTINGS_FILE), move |config: SplitConfig| {
                ledger.configure(config)
            })
            .await?,
        );
        summary.merge(
            self.import_file(&dir.join(EXPENSES_FILE), move |expense: Expense| {
                ledger.add_expense(expense)
            })
            .await?,
        );
        summary.merge(
            self.import_file(
                &dir.join(INSTALLMENTS_FILE),
                move |payment: InstallmentPayment| ledger.mark_installment_paid(payment),
            )
            .await?,
        );
        summary.merge(
            self.import_file(&dir.join(TRANSFERS_FILE), move |transfer: Transfer| {
                ledger.record_transfer(transfer)
            })
            .await?,
        );
        summary.merge(
            self.import_file(&dir.join(FIXED_EXPENSES_FILE), move |fixed: FixedExpense| {
                ledger.add_fixed_expense(fixed)
            })
            .await?,
        );

        info!(
            dir = %dir.display(),
            imported = summary.imported,
            skipped = summary.skipped,
            existing = summary.existing,
            "ledger imported"
        );
        Ok(summary)
    }

    /// Feeds every row of `path` to `apply`. A missing file imports nothing.
    async fn import_file<T, F, Fut>(&self, path: &Path, apply: F) -> Result<ImportSummary>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut summary = ImportSummary::default();
        if !path.exists() {
            return Ok(summary);
        }

        let file = File::open(path)?;
        for (index, record) in RecordReader::<_, T>::new(file).records().enumerate() {
            // Header is line 1.
            let line = index + 2;
            let outcome = match record {
                Ok(record) => apply(record).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(()) => summary.imported += 1,
                Err(LedgerError::Duplicate(what)) => {
                    debug!(file = %path.display(), line, %what, "row already present");
                    summary.existing += 1;
                }
                Err(err) => {
                    warn!(file = %path.display(), line, error = %err, "skipping row");
                    summary.skipped += 1;
                }
            }
        }
        Ok(summary)
    }
}
