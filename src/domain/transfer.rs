use super::money::Amount;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type TransferId = u32;

/// A direct reimbursement from one person to the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub from_person: String,
    pub to_person: String,
    pub amount: Amount,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}
