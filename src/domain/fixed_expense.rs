use super::money::Amount;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type FixedExpenseId = u32;

/// Estimate of a recurring cost. Used for planning, never part of a balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedExpense {
    pub id: FixedExpenseId,
    pub description: String,
    pub amount: Amount,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: NaiveDateTime,
}
