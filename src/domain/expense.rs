use super::money::{Amount, Percentage};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type ExpenseId = u32;

/// How an expense's cost is divided between the two persons.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    /// Configured split percentage.
    #[default]
    Default,
    /// Per-expense percentage for person 1.
    Custom,
    /// Not divided; the payer carries the whole cost.
    PayerOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Amount,
    pub paid_by: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub split_type: SplitType,
    #[serde(default)]
    pub custom_percentage: Option<Percentage>,
    #[serde(default)]
    pub is_installment: bool,
    #[serde(default)]
    pub total_installments: Option<u32>,
    #[serde(default)]
    pub installment_payer: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Expense {
    /// Amount realized by each paid installment.
    ///
    /// A missing or zero installment count is treated as a single installment.
    pub fn installment_share(&self) -> Decimal {
        let count = self.total_installments.filter(|n| *n > 0).unwrap_or(1);
        self.amount.value() / Decimal::from(count)
    }
}

/// Records that one installment of an installment expense was settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPayment {
    pub id: u32,
    pub expense_id: ExpenseId,
    pub installment_number: u32,
    pub paid_at: NaiveDateTime,
}
