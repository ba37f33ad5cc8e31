use super::expense::{Expense, ExpenseId, InstallmentPayment};
use super::fixed_expense::{FixedExpense, FixedExpenseId};
use super::period::{DateRange, within};
use super::settings::SplitConfig;
use super::transfer::{Transfer, TransferId};
use crate::error::Result;
use async_trait::async_trait;

/// Selects expenses. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub is_installment: Option<bool>,
    pub created_at: Option<DateRange>,
    pub category: Option<String>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        self.is_installment
            .is_none_or(|flag| expense.is_installment == flag)
            && within(self.created_at.as_ref(), expense.created_at)
            && self
                .category
                .as_deref()
                .is_none_or(|category| expense.category.as_deref() == Some(category))
    }
}

/// Selects installment payments. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallmentPaymentFilter {
    pub expense_id: Option<ExpenseId>,
    pub paid_at: Option<DateRange>,
}

impl InstallmentPaymentFilter {
    pub fn matches(&self, payment: &InstallmentPayment) -> bool {
        self.expense_id.is_none_or(|id| payment.expense_id == id)
            && within(self.paid_at.as_ref(), payment.paid_at)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferFilter {
    pub created_at: Option<DateRange>,
}

impl TransferFilter {
    pub fn matches(&self, transfer: &Transfer) -> bool {
        within(self.created_at.as_ref(), transfer.created_at)
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn store(&self, config: SplitConfig) -> Result<()>;
    async fn get(&self) -> Result<Option<SplitConfig>>;
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn store(&self, expense: Expense) -> Result<()>;
    async fn get(&self, id: ExpenseId) -> Result<Option<Expense>>;
    async fn delete(&self, id: ExpenseId) -> Result<bool>;
    async fn list(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>>;
}

#[async_trait]
pub trait InstallmentPaymentStore: Send + Sync {
    /// Keyed by `(expense_id, installment_number)`; storing again replaces.
    async fn store(&self, payment: InstallmentPayment) -> Result<()>;
    async fn get(
        &self,
        expense_id: ExpenseId,
        installment_number: u32,
    ) -> Result<Option<InstallmentPayment>>;
    async fn delete(&self, expense_id: ExpenseId, installment_number: u32) -> Result<bool>;
    async fn list(&self, filter: &InstallmentPaymentFilter) -> Result<Vec<InstallmentPayment>>;
}

#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn store(&self, transfer: Transfer) -> Result<()>;
    async fn get(&self, id: TransferId) -> Result<Option<Transfer>>;
    async fn delete(&self, id: TransferId) -> Result<bool>;
    async fn list(&self, filter: &TransferFilter) -> Result<Vec<Transfer>>;
}

#[async_trait]
pub trait FixedExpenseStore: Send + Sync {
    async fn store(&self, fixed: FixedExpense) -> Result<()>;
    async fn get(&self, id: FixedExpenseId) -> Result<Option<FixedExpense>>;
    async fn delete(&self, id: FixedExpenseId) -> Result<bool>;
    async fn all(&self) -> Result<Vec<FixedExpense>>;
}

pub type SettingsStoreBox = Box<dyn SettingsStore>;
pub type ExpenseStoreBox = Box<dyn ExpenseStore>;
pub type InstallmentPaymentStoreBox = Box<dyn InstallmentPaymentStore>;
pub type TransferStoreBox = Box<dyn TransferStore>;
pub type FixedExpenseStoreBox = Box<dyn FixedExpenseStore>;

/// Every port a ledger needs, bundled so services can share one handle.
pub struct LedgerStores {
    pub settings: SettingsStoreBox,
    pub expenses: ExpenseStoreBox,
    pub installments: InstallmentPaymentStoreBox,
    pub transfers: TransferStoreBox,
    pub fixed_expenses: FixedExpenseStoreBox,
}

pub type LedgerStoresFactory = Box<dyn Fn() -> LedgerStores + Send + Sync>;
