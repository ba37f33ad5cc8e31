//! Per-record share calculation.
//!
//! Every balance contribution (a regular expense or one paid installment) is
//! reduced to a [`Charge`]: an amount, the person who fronted it and the
//! split rule. A charge produces at most one debt, owed by the person who did
//! not pay.

use super::expense::{Expense, SplitType};
use super::money::Percentage;
use super::settings::{Person, SplitConfig};
use rust_decimal::Decimal;

/// What each person is responsible for out of a single amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shares {
    pub person1: Decimal,
    pub person2: Decimal,
}

impl Shares {
    /// Splits `amount` according to `split_type`.
    ///
    /// Returns `None` for `payer_only`. A `custom` split without a percentage
    /// falls back to the configured split.
    pub fn compute(
        amount: Decimal,
        split_type: SplitType,
        custom_percentage: Option<Percentage>,
        config: &SplitConfig,
    ) -> Option<Self> {
        match (split_type, custom_percentage) {
            (SplitType::PayerOnly, _) => None,
            (SplitType::Custom, Some(custom)) => {
                let person1 = custom.of(amount);
                Some(Self {
                    person1,
                    person2: amount - person1,
                })
            }
            (SplitType::Custom, None) | (SplitType::Default, _) => Some(Self {
                person1: config.person1_percentage.of(amount),
                person2: config.person2_percentage().of(amount),
            }),
        }
    }

    pub fn of(&self, person: Person) -> Decimal {
        match person {
            Person::Person1 => self.person1,
            Person::Person2 => self.person2,
        }
    }
}

/// A single amount that one person fronted for both.
#[derive(Debug, Clone, Copy)]
pub struct Charge<'a> {
    pub amount: Decimal,
    pub payer: Option<&'a str>,
    pub split_type: SplitType,
    pub custom_percentage: Option<Percentage>,
}

impl<'a> Charge<'a> {
    /// The full amount of a regular expense, fronted by `paid_by`.
    pub fn expense(expense: &'a Expense) -> Self {
        Self {
            amount: expense.amount.value(),
            payer: Some(&expense.paid_by),
            split_type: expense.split_type,
            custom_percentage: expense.custom_percentage,
        }
    }

    /// One installment of an installment expense, fronted by `installment_payer`.
    pub fn installment(expense: &'a Expense) -> Self {
        Self {
            amount: expense.installment_share(),
            payer: expense.installment_payer.as_deref(),
            split_type: expense.split_type,
            custom_percentage: expense.custom_percentage,
        }
    }

    /// The debt this charge creates: who owes, and how much.
    ///
    /// The non-paying person owes their own share back to the payer. An
    /// unknown payer or a `payer_only` split creates no debt.
    pub fn debt(&self, config: &SplitConfig) -> Option<(Person, Decimal)> {
        let shares = Shares::compute(
            self.amount,
            self.split_type,
            self.custom_percentage,
            config,
        )?;
        let debtor = match config.identify(self.payer?)? {
            Person::Person1 => Person::Person2,
            Person::Person2 => Person::Person1,
        };
        Some((debtor, shares.of(debtor)))
    }
}
