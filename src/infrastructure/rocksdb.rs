use crate::domain::expense::{Expense, ExpenseId, InstallmentPayment};
use crate::domain::fixed_expense::{FixedExpense, FixedExpenseId};
use crate::domain::ports::{
    ExpenseFilter, ExpenseStore, FixedExpenseStore, InstallmentPaymentFilter,
    InstallmentPaymentStore, LedgerStores, SettingsStore, TransferFilter, TransferStore,
};
use crate::domain::settings::SplitConfig;
use crate::domain::transfer::{Transfer, TransferId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

pub const CF_SETTINGS: &str = "settings";
pub const CF_EXPENSES: &str = "expenses";
pub const CF_INSTALLMENTS: &str = "installment_payments";
pub const CF_TRANSFERS: &str = "transfers";
pub const CF_FIXED_EXPENSES: &str = "fixed_expenses";

const COLUMN_FAMILIES: [&str; 5] = [
    CF_SETTINGS,
    CF_EXPENSES,
    CF_INSTALLMENTS,
    CF_TRANSFERS,
    CF_FIXED_EXPENSES,
];

const SPLIT_CONFIG_KEY: &[u8] = b"split_config";

/// A persistent ledger backed by RocksDB.
///
/// Each record kind lives in its own column family, values are JSON encoded
/// and keys are big-endian ids so iteration follows id order. `Clone` shares
/// the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a ledger database at `path`, creating missing column
    /// families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Every ledger port served by this one database.
    pub fn into_ledger_stores(self) -> LedgerStores {
        LedgerStores {
            settings: Box::new(self.clone()),
            expenses: Box::new(self.clone()),
            installments: Box::new(self.clone()),
            transfers: Box::new(self.clone()),
            fixed_expenses: Box::new(self),
        }
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::upstream(std::io::Error::other(format!(
                "{name} column family not found"
            )))
        })
    }

    fn put<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value).map_err(LedgerError::upstream)?;
        self.db.put_cf(self.cf(cf)?, key, bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_pinned_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(LedgerError::upstream)?,
            )),
            None => Ok(None),
        }
    }

    fn remove(&self, cf: &str, key: &[u8]) -> Result<bool> {
        let handle = self.cf(cf)?;
        if self.db.get_pinned_cf(handle, key)?.is_none() {
            return Ok(false);
        }
        self.db.delete_cf(handle, key)?;
        Ok(true)
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut records = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value).map_err(LedgerError::upstream)?);
        }
        Ok(records)
    }
}

fn installment_key(expense_id: ExpenseId, installment_number: u32) -> [u8; 8] {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&expense_id.to_be_bytes());
    key[4..].copy_from_slice(&installment_number.to_be_bytes());
    key
}

#[async_trait]
impl SettingsStore for RocksDBStore {
    async fn store(&self, config: SplitConfig) -> Result<()> {
        self.put(CF_SETTINGS, SPLIT_CONFIG_KEY, &config)
    }

    async fn get(&self) -> Result<Option<SplitConfig>> {
        self.fetch(CF_SETTINGS, SPLIT_CONFIG_KEY)
    }
}

#[async_trait]
impl ExpenseStore for RocksDBStore {
    async fn store(&self, expense: Expense) -> Result<()> {
        self.put(CF_EXPENSES, &expense.id.to_be_bytes(), &expense)
    }

    async fn get(&self, id: ExpenseId) -> Result<Option<Expense>> {
        self.fetch(CF_EXPENSES, &id.to_be_bytes())
    }

    async fn delete(&self, id: ExpenseId) -> Result<bool> {
        self.remove(CF_EXPENSES, &id.to_be_bytes())
    }

    async fn list(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let mut expenses: Vec<Expense> = self.scan(CF_EXPENSES)?;
        expenses.retain(|e| filter.matches(e));
        Ok(expenses)
    }
}

#[async_trait]
impl InstallmentPaymentStore for RocksDBStore {
    async fn store(&self, payment: InstallmentPayment) -> Result<()> {
        let key = installment_key(payment.expense_id, payment.installment_number);
        self.put(CF_INSTALLMENTS, &key, &payment)
    }

    async fn get(
        &self,
        expense_id: ExpenseId,
        installment_number: u32,
    ) -> Result<Option<InstallmentPayment>> {
        self.fetch(
            CF_INSTALLMENTS,
            &installment_key(expense_id, installment_number),
        )
    }

    async fn delete(&self, expense_id: ExpenseId, installment_number: u32) -> Result<bool> {
        self.remove(
            CF_INSTALLMENTS,
            &installment_key(expense_id, installment_number),
        )
    }

    async fn list(&self, filter: &InstallmentPaymentFilter) -> Result<Vec<InstallmentPayment>> {
        let mut payments: Vec<InstallmentPayment> = self.scan(CF_INSTALLMENTS)?;
        payments.retain(|p| filter.matches(p));
        Ok(payments)
    }
}

#[async_trait]
impl TransferStore for RocksDBStore {
    async fn store(&self, transfer: Transfer) -> Result<()> {
        self.put(CF_TRANSFERS, &transfer.id.to_be_bytes(), &transfer)
    }

    async fn get(&self, id: TransferId) -> Result<Option<Transfer>> {
        self.fetch(CF_TRANSFERS, &id.to_be_bytes())
    }

    async fn delete(&self, id: TransferId) -> Result<bool> {
        self.remove(CF_TRANSFERS, &id.to_be_bytes())
    }

    async fn list(&self, filter: &TransferFilter) -> Result<Vec<Transfer>> {
        let mut transfers: Vec<Transfer> = self.scan(CF_TRANSFERS)?;
        transfers.retain(|t| filter.matches(t));
        Ok(transfers)
    }
}

#[async_trait]
impl FixedExpenseStore for RocksDBStore {
    async fn store(&self, fixed: FixedExpense) -> Result<()> {
        self.put(CF_FIXED_EXPENSES, &fixed.id.to_be_bytes(), &fixed)
    }

    async fn get(&self, id: FixedExpenseId) -> Result<Option<FixedExpense>> {
        self.fetch(CF_FIXED_EXPENSES, &id.to_be_bytes())
    }

    async fn delete(&self, id: FixedExpenseId) -> Result<bool> {
        self.remove(CF_FIXED_EXPENSES, &id.to_be_bytes())
    }

    async fn all(&self) -> Result<Vec<FixedExpense>> {
        self.scan(CF_FIXED_EXPENSES)
    }
}
