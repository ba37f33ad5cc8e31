use crate::error::{LedgerError, Result};
use chrono::{Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Inclusive timestamp range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

/// `true` when there is no range or `at` falls inside it.
pub fn within(range: Option<&DateRange>, at: NaiveDateTime) -> bool {
    range.is_none_or(|r| r.contains(at))
}

/// A calendar month used to restrict a balance or listing.
///
/// Covers the first day at 00:00:00 through the last day at 23:59:59 in local
/// wall-clock time, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    month: u32,
    year: i32,
    range: DateRange,
}

impl Window {
    pub fn new(month: u32, year: i32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::Validation(format!(
                "Month must be between 1 and 12, got {month}"
            )));
        }
        let invalid = || LedgerError::Validation(format!("Unsupported period {year}-{month:02}"));

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)?;

        let range = DateRange {
            start: first.and_hms_opt(0, 0, 0).ok_or_else(invalid)?,
            end: last.and_hms_opt(23, 59, 59).ok_or_else(invalid)?,
        };
        Ok(Self { month, year, range })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn range(&self) -> DateRange {
        self.range
    }
}
