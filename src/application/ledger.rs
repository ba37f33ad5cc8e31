use crate::domain::expense::{Expense, ExpenseId, InstallmentPayment, SplitType};
use crate::domain::fixed_expense::{FixedExpense, FixedExpenseId};
use crate::domain::money::Amount;
use crate::domain::period::Window;
use crate::domain::ports::{ExpenseFilter, InstallmentPaymentFilter, LedgerStores, TransferFilter};
use crate::domain::settings::{SplitConfig, same_person};
use crate::domain::transfer::{Transfer, TransferId};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

const NAME_MAX: usize = 50;
const DESCRIPTION_MAX: usize = 255;
const CATEGORY_MAX: usize = 50;

/// Payment progress of one installment expense.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallmentStatus {
    pub expense_id: ExpenseId,
    pub description: String,
    pub total_installments: u32,
    pub paid_count: u32,
    pub remaining_count: u32,
    /// Amount realized by each paid installment, at full precision.
    pub installment_amount: Decimal,
    /// Paid installments ordered by installment number.
    pub paid: Vec<InstallmentPayment>,
}

/// Validated write access to a ledger.
///
/// Every mutation goes through here so the stores only ever hold records the
/// balance engine can rely on.
pub struct LedgerService {
    stores: Arc<LedgerStores>,
}

impl LedgerService {
    pub fn new(stores: Arc<LedgerStores>) -> Self {
        Self { stores }
    }

    pub async fn configure(&self, config: SplitConfig) -> Result<()> {
        require_text("person1_name", &config.person1_name, NAME_MAX)?;
        require_text("person2_name", &config.person2_name, NAME_MAX)?;
        if same_person(&config.person1_name, &config.person2_name) {
            return Err(LedgerError::Validation(
                "person1_name and person2_name must differ".to_string(),
            ));
        }

        info!(
            person1 = %config.person1_name,
            person2 = %config.person2_name,
            person1_percentage = config.person1_percentage.value(),
            "split configuration updated"
        );
        self.stores.settings.store(config).await
    }

    pub async fn settings(&self) -> Result<SplitConfig> {
        self.stores
            .settings
            .get()
            .await?
            .ok_or(LedgerError::ConfigurationMissing)
    }

    pub async fn add_expense(&self, expense: Expense) -> Result<()> {
        validate_expense(&expense)?;
        if self.stores.expenses.get(expense.id).await?.is_some() {
            return Err(LedgerError::Duplicate(format!("expense {}", expense.id)));
        }
        debug!(id = expense.id, amount = %expense.amount, "expense added");
        self.stores.expenses.store(expense).await
    }

    /// Replaces an expense. Installments already paid must still fit the
    /// new installment count.
    pub async fn update_expense(&self, expense: Expense) -> Result<()> {
        validate_expense(&expense)?;
        self.expense(expense.id).await?;

        let paid = self.paid_installments(expense.id).await?;
        if !paid.is_empty() {
            if !expense.is_installment {
                return Err(LedgerError::Validation(format!(
                    "expense {} has {} paid installments and must stay an installment expense",
                    expense.id,
                    paid.len()
                )));
            }
            let total = installment_total(&expense)?;
            if let Some(last) = paid.iter().map(|p| p.installment_number).max()
                && last > total
            {
                return Err(LedgerError::Validation(format!(
                    "installment {last} of expense {} is already paid; total_installments must be at least {last}, got {total}",
                    expense.id
                )));
            }
        }

        debug!(id = expense.id, "expense updated");
        self.stores.expenses.store(expense).await
    }

    /// Deletes an expense together with its installment payments.
    ///
    /// Payments go first so a failure never leaves them behind a freed id.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<()> {
        self.expense(id).await?;

        let payments = self.paid_installments(id).await?;
        for payment in &payments {
            self.stores
                .installments
                .delete(payment.expense_id, payment.installment_number)
                .await?;
        }
        if !self.stores.expenses.delete(id).await? {
            return Err(LedgerError::NotFound(format!("expense {id}")));
        }
        debug!(id, payments = payments.len(), "expense deleted");
        Ok(())
    }

    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>> {
        self.stores.expenses.get(id).await
    }

    /// Expenses created within `window` (all time when `None`), optionally
    /// restricted to one category, newest first.
    pub async fn list_expenses(
        &self,
        window: Option<Window>,
        category: Option<&str>,
    ) -> Result<Vec<Expense>> {
        let filter = ExpenseFilter {
            is_installment: None,
            created_at: window.map(|w| w.range()),
            category: category.map(str::to_string),
        };
        let mut expenses = self.stores.expenses.list(&filter).await?;
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(expenses)
    }

    pub async fn mark_installment_paid(&self, payment: InstallmentPayment) -> Result<()> {
        let expense = self.expense(payment.expense_id).await?;
        let total = installment_total(&expense)?;
        if !(1..=total).contains(&payment.installment_number) {
            return Err(LedgerError::Validation(format!(
                "installment number must be between 1 and {total}, got {}",
                payment.installment_number
            )));
        }
        if self
            .stores
            .installments
            .get(payment.expense_id, payment.installment_number)
            .await?
            .is_some()
        {
            return Err(LedgerError::Duplicate(format!(
                "installment {} of expense {}",
                payment.installment_number, payment.expense_id
            )));
        }

        debug!(
            expense_id = payment.expense_id,
            installment = payment.installment_number,
            "installment marked as paid"
        );
        self.stores.installments.store(payment).await
    }

    pub async fn unmark_installment(
        &self,
        expense_id: ExpenseId,
        installment_number: u32,
    ) -> Result<()> {
        if !self
            .stores
            .installments
            .delete(expense_id, installment_number)
            .await?
        {
            return Err(LedgerError::NotFound(format!(
                "installment {installment_number} of expense {expense_id} is not paid"
            )));
        }
        debug!(expense_id, installment = installment_number, "installment unmarked");
        Ok(())
    }

    pub async fn installment_status(&self, expense_id: ExpenseId) -> Result<InstallmentStatus> {
        let expense = self.expense(expense_id).await?;
        let total = installment_total(&expense)?;

        let paid = self.paid_installments(expense_id).await?;
        let paid_count = u32::try_from(paid.len()).unwrap_or(u32::MAX);
        Ok(InstallmentStatus {
            expense_id,
            description: expense.description.clone(),
            total_installments: total,
            paid_count,
            remaining_count: total.saturating_sub(paid_count),
            installment_amount: expense.installment_share(),
            paid,
        })
    }

    pub async fn record_transfer(&self, transfer: Transfer) -> Result<()> {
        require_text("from_person", &transfer.from_person, NAME_MAX)?;
        require_text("to_person", &transfer.to_person, NAME_MAX)?;
        if same_person(&transfer.from_person, &transfer.to_person) {
            return Err(LedgerError::Validation(
                "from_person and to_person must differ".to_string(),
            ));
        }
        require_cents("amount", transfer.amount)?;
        if let Some(description) = &transfer.description {
            limit_text("description", description, DESCRIPTION_MAX)?;
        }
        if self.stores.transfers.get(transfer.id).await?.is_some() {
            return Err(LedgerError::Duplicate(format!("transfer {}", transfer.id)));
        }

        debug!(id = transfer.id, amount = %transfer.amount, "transfer recorded");
        self.stores.transfers.store(transfer).await
    }

    pub async fn delete_transfer(&self, id: TransferId) -> Result<()> {
        if !self.stores.transfers.delete(id).await? {
            return Err(LedgerError::NotFound(format!("transfer {id}")));
        }
        Ok(())
    }

    /// Transfers made within `window` (all time when `None`), newest first.
    pub async fn list_transfers(&self, window: Option<Window>) -> Result<Vec<Transfer>> {
        let filter = TransferFilter {
            created_at: window.map(|w| w.range()),
        };
        let mut transfers = self.stores.transfers.list(&filter).await?;
        transfers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(transfers)
    }

    pub async fn add_fixed_expense(&self, fixed: FixedExpense) -> Result<()> {
        validate_fixed_expense(&fixed)?;
        if self.stores.fixed_expenses.get(fixed.id).await?.is_some() {
            return Err(LedgerError::Duplicate(format!("fixed expense {}", fixed.id)));
        }
        self.stores.fixed_expenses.store(fixed).await
    }

    pub async fn update_fixed_expense(&self, fixed: FixedExpense) -> Result<()> {
        validate_fixed_expense(&fixed)?;
        if self.stores.fixed_expenses.get(fixed.id).await?.is_none() {
            return Err(LedgerError::NotFound(format!("fixed expense {}", fixed.id)));
        }
        self.stores.fixed_expenses.store(fixed).await
    }

    pub async fn delete_fixed_expense(&self, id: FixedExpenseId) -> Result<()> {
        if !self.stores.fixed_expenses.delete(id).await? {
            return Err(LedgerError::NotFound(format!("fixed expense {id}")));
        }
        Ok(())
    }

    /// Fixed expenses ordered by description.
    pub async fn list_fixed_expenses(&self) -> Result<Vec<FixedExpense>> {
        let mut fixed = self.stores.fixed_expenses.all().await?;
        fixed.sort_by(|a, b| a.description.cmp(&b.description));
        Ok(fixed)
    }

    /// Sum of all fixed expense estimates, unrounded.
    pub async fn fixed_expenses_total(&self) -> Result<Decimal> {
        let fixed = self.stores.fixed_expenses.all().await?;
        Ok(fixed.iter().map(|f| f.amount.value()).sum())
    }

    /// Paid installments of one expense, ordered by installment number.
    async fn paid_installments(&self, expense_id: ExpenseId) -> Result<Vec<InstallmentPayment>> {
        let mut paid = self
            .stores
            .installments
            .list(&InstallmentPaymentFilter {
                expense_id: Some(expense_id),
                paid_at: None,
            })
            .await?;
        paid.sort_by_key(|p| p.installment_number);
        Ok(paid)
    }

    async fn expense(&self, id: ExpenseId) -> Result<Expense> {
        self.stores
            .expenses
            .get(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("expense {id}")))
    }
}

fn installment_total(expense: &Expense) -> Result<u32> {
    if !expense.is_installment {
        return Err(LedgerError::Validation(format!(
            "expense {} is not an installment expense",
            expense.id
        )));
    }
    Ok(expense.total_installments.filter(|n| *n > 0).unwrap_or(1))
}

fn validate_expense(expense: &Expense) -> Result<()> {
    require_text("description", &expense.description, DESCRIPTION_MAX)?;
    require_text("paid_by", &expense.paid_by, NAME_MAX)?;
    require_cents("amount", expense.amount)?;
    if let Some(category) = &expense.category {
        limit_text("category", category, CATEGORY_MAX)?;
    }
    if expense.split_type == SplitType::Custom && expense.custom_percentage.is_none() {
        return Err(LedgerError::Validation(
            "custom split requires custom_percentage".to_string(),
        ));
    }
    if expense.is_installment {
        if expense.total_installments.is_none_or(|n| n == 0) {
            return Err(LedgerError::Validation(
                "installment expense requires total_installments of at least 1".to_string(),
            ));
        }
        match &expense.installment_payer {
            Some(payer) => require_text("installment_payer", payer, NAME_MAX)?,
            None => {
                return Err(LedgerError::Validation(
                    "installment expense requires installment_payer".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_fixed_expense(fixed: &FixedExpense) -> Result<()> {
    require_text("description", &fixed.description, DESCRIPTION_MAX)?;
    require_cents("amount", fixed.amount)?;
    if let Some(category) = &fixed.category {
        limit_text("category", category, CATEGORY_MAX)?;
    }
    Ok(())
}

fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::Validation(format!("{field} must not be empty")));
    }
    limit_text(field, value, max)
}

fn limit_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(LedgerError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn require_cents(field: &str, amount: Amount) -> Result<()> {
    if !amount.is_cents() {
        return Err(LedgerError::Validation(format!(
            "{field} must be a whole number of cents, got {amount}"
        )));
    }
    Ok(())
}
