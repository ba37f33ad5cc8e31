use crate::domain::expense::{Expense, ExpenseId, InstallmentPayment};
use crate::domain::fixed_expense::{FixedExpense, FixedExpenseId};
use crate::domain::ports::{
    ExpenseFilter, ExpenseStore, FixedExpenseStore, InstallmentPaymentFilter,
    InstallmentPaymentStore, LedgerStores, SettingsStore, TransferFilter, TransferStore,
};
use crate::domain::settings::SplitConfig;
use crate::domain::transfer::{Transfer, TransferId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Holds the single split configuration.
#[derive(Default, Clone)]
pub struct InMemorySettingsStore {
    config: Arc<RwLock<Option<SplitConfig>>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn store(&self, config: SplitConfig) -> Result<()> {
        *self.config.write().await = Some(config);
        Ok(())
    }

    async fn get(&self) -> Result<Option<SplitConfig>> {
        Ok(self.config.read().await.clone())
    }
}

/// Thread-safe expense store.
///
/// Uses a `BTreeMap` so listings come back in id order.
#[derive(Default, Clone)]
pub struct InMemoryExpenseStore {
    expenses: Arc<RwLock<BTreeMap<ExpenseId, Expense>>>,
}

impl InMemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseStore for InMemoryExpenseStore {
    async fn store(&self, expense: Expense) -> Result<()> {
        self.expenses.write().await.insert(expense.id, expense);
        Ok(())
    }

    async fn get(&self, id: ExpenseId) -> Result<Option<Expense>> {
        Ok(self.expenses.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: ExpenseId) -> Result<bool> {
        Ok(self.expenses.write().await.remove(&id).is_some())
    }

    async fn list(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }
}

/// Installment payments keyed by `(expense_id, installment_number)`.
#[derive(Default, Clone)]
pub struct InMemoryInstallmentPaymentStore {
    payments: Arc<RwLock<BTreeMap<(ExpenseId, u32), InstallmentPayment>>>,
}

impl InMemoryInstallmentPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InstallmentPaymentStore for InMemoryInstallmentPaymentStore {
    async fn store(&self, payment: InstallmentPayment) -> Result<()> {
        let key = (payment.expense_id, payment.installment_number);
        self.payments.write().await.insert(key, payment);
        Ok(())
    }

    async fn get(
        &self,
        expense_id: ExpenseId,
        installment_number: u32,
    ) -> Result<Option<InstallmentPayment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&(expense_id, installment_number)).cloned())
    }

    async fn delete(&self, expense_id: ExpenseId, installment_number: u32) -> Result<bool> {
        let mut payments = self.payments.write().await;
        Ok(payments.remove(&(expense_id, installment_number)).is_some())
    }

    async fn list(&self, filter: &InstallmentPaymentFilter) -> Result<Vec<InstallmentPayment>> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTransferStore {
    transfers: Arc<RwLock<BTreeMap<TransferId, Transfer>>>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransferStore for InMemoryTransferStore {
    async fn store(&self, transfer: Transfer) -> Result<()> {
        self.transfers.write().await.insert(transfer.id, transfer);
        Ok(())
    }

    async fn get(&self, id: TransferId) -> Result<Option<Transfer>> {
        Ok(self.transfers.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: TransferId) -> Result<bool> {
        Ok(self.transfers.write().await.remove(&id).is_some())
    }

    async fn list(&self, filter: &TransferFilter) -> Result<Vec<Transfer>> {
        let transfers = self.transfers.read().await;
        Ok(transfers
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryFixedExpenseStore {
    fixed: Arc<RwLock<BTreeMap<FixedExpenseId, FixedExpense>>>,
}

impl InMemoryFixedExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FixedExpenseStore for InMemoryFixedExpenseStore {
    async fn store(&self, fixed: FixedExpense) -> Result<()> {
        self.fixed.write().await.insert(fixed.id, fixed);
        Ok(())
    }

    async fn get(&self, id: FixedExpenseId) -> Result<Option<FixedExpense>> {
        Ok(self.fixed.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: FixedExpenseId) -> Result<bool> {
        Ok(self.fixed.write().await.remove(&id).is_some())
    }

    async fn all(&self) -> Result<Vec<FixedExpense>> {
        Ok(self.fixed.read().await.values().cloned().collect())
    }
}

impl LedgerStores {
    /// A fresh, empty ledger held in process memory.
    pub fn in_memory() -> Self {
        Self {
            settings: Box::new(InMemorySettingsStore::new()),
            expenses: Box::new(InMemoryExpenseStore::new()),
            installments: Box::new(InMemoryInstallmentPaymentStore::new()),
            transfers: Box::new(InMemoryTransferStore::new()),
            fixed_expenses: Box::new(InMemoryFixedExpenseStore::new()),
        }
    }
}
