use crate::domain::expense::{Expense, ExpenseId, InstallmentPayment};
use crate::domain::money::round_cents;
use crate::domain::period::Window;
use crate::domain::ports::{ExpenseFilter, InstallmentPaymentFilter, LedgerStores, TransferFilter};
use crate::domain::settings::{Person, SplitConfig};
use crate::domain::split::Charge;
use crate::domain::transfer::Transfer;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Net balances smaller than this are reported as settled.
pub const EVEN_TOLERANCE: Decimal = dec!(0.01);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WhoOwes {
    Person1,
    Person2,
    Even,
}

/// Outcome of a balance computation. Every figure is rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceResult {
    pub person1_name: String,
    pub person2_name: String,
    /// Gross share person 1 owes for costs person 2 fronted.
    pub person1_owes: Decimal,
    /// Gross share person 2 owes for costs person 1 fronted.
    pub person2_owes: Decimal,
    /// Transfers from person 1 to person 2.
    pub person1_paid: Decimal,
    /// Transfers from person 2 to person 1.
    pub person2_paid: Decimal,
    /// Positive when person 1 is the debtor.
    pub net_balance: Decimal,
    pub who_owes: WhoOwes,
    /// Absolute outstanding debt, zero when even.
    pub amount: Decimal,
}

/// The records a balance is computed from.
///
/// `expenses` may mix regular and installment expenses; installment expenses
/// only contribute through their paid installments.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub expenses: Vec<Expense>,
    pub installment_payments: Vec<InstallmentPayment>,
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Default)]
struct Totals {
    person1_owes: Decimal,
    person2_owes: Decimal,
    person1_paid: Decimal,
    person2_paid: Decimal,
}

impl Totals {
    fn add_charge(&mut self, charge: Charge<'_>, config: &SplitConfig) {
        match charge.debt(config) {
            Some((Person::Person1, share)) => self.person1_owes += share,
            Some((Person::Person2, share)) => self.person2_owes += share,
            None => {}
        }
    }

    fn add_transfer(&mut self, transfer: &Transfer, config: &SplitConfig) {
        let from = config.identify(&transfer.from_person);
        let to = config.identify(&transfer.to_person);
        match (from, to) {
            (Some(Person::Person1), Some(Person::Person2)) => {
                self.person1_paid += transfer.amount.value()
            }
            (Some(Person::Person2), Some(Person::Person1)) => {
                self.person2_paid += transfer.amount.value()
            }
            _ => {}
        }
    }

    fn into_result(self, config: &SplitConfig) -> BalanceResult {
        let person1_net = self.person1_owes - self.person1_paid;
        let person2_net = self.person2_owes - self.person2_paid;
        let net_balance = person1_net - person2_net;

        let (who_owes, amount) = if net_balance.abs() < EVEN_TOLERANCE {
            (WhoOwes::Even, Decimal::ZERO)
        } else if net_balance > Decimal::ZERO {
            (WhoOwes::Person1, net_balance)
        } else {
            (WhoOwes::Person2, net_balance.abs())
        };

        BalanceResult {
            person1_name: config.person1_name.clone(),
            person2_name: config.person2_name.clone(),
            person1_owes: round_cents(self.person1_owes),
            person2_owes: round_cents(self.person2_owes),
            person1_paid: round_cents(self.person1_paid),
            person2_paid: round_cents(self.person2_paid),
            net_balance: round_cents(net_balance),
            who_owes,
            amount: round_cents(amount),
        }
    }
}

/// Computes who owes whom from a snapshot of ledger records.
///
/// Regular expenses count by `created_at`, installment shares by the
/// `paid_at` of each installment payment, transfers by `created_at`. With no
/// window every record counts. Accumulation is exact; rounding happens once
/// on the reported figures.
pub fn calculate_balance(
    config: &SplitConfig,
    snapshot: &LedgerSnapshot,
    window: Option<&Window>,
) -> BalanceResult {
    let range = window.map(Window::range);
    let mut totals = Totals::default();

    let regular = ExpenseFilter {
        is_installment: Some(false),
        created_at: range,
        category: None,
    };
    for expense in snapshot.expenses.iter().filter(|e| regular.matches(e)) {
        totals.add_charge(Charge::expense(expense), config);
    }

    let installment_expenses: HashMap<ExpenseId, &Expense> = snapshot
        .expenses
        .iter()
        .filter(|e| e.is_installment)
        .map(|e| (e.id, e))
        .collect();
    let paid = InstallmentPaymentFilter {
        expense_id: None,
        paid_at: range,
    };
    for payment in snapshot
        .installment_payments
        .iter()
        .filter(|p| paid.matches(p))
    {
        if let Some(expense) = installment_expenses.get(&payment.expense_id) {
            totals.add_charge(Charge::installment(expense), config);
        }
    }

    let transfers = TransferFilter { created_at: range };
    for transfer in snapshot.transfers.iter().filter(|t| transfers.matches(t)) {
        totals.add_transfer(transfer, config);
    }

    totals.into_result(config)
}

/// Reads a consistent snapshot from the ledger stores and computes balances.
///
/// Holds no state between calls and never writes, so it can be shared freely.
pub struct BalanceEngine {
    stores: Arc<LedgerStores>,
}

impl BalanceEngine {
    pub fn new(stores: Arc<LedgerStores>) -> Self {
        Self { stores }
    }

    /// Computes the balance for `window`, or for all time when `None`.
    ///
    /// Fails with [`LedgerError::ConfigurationMissing`] when the ledger has
    /// no split configuration; store failures propagate unchanged.
    #[instrument(skip(self))]
    pub async fn compute_balance(&self, window: Option<Window>) -> Result<BalanceResult> {
        let config = self
            .stores
            .settings
            .get()
            .await?
            .ok_or(LedgerError::ConfigurationMissing)?;

        let snapshot = self.snapshot(window.as_ref()).await?;
        debug!(
            expenses = snapshot.expenses.len(),
            installment_payments = snapshot.installment_payments.len(),
            transfers = snapshot.transfers.len(),
            "loaded ledger snapshot"
        );

        let result = calculate_balance(&config, &snapshot, window.as_ref());
        debug!(who_owes = ?result.who_owes, amount = %result.amount, "balance computed");
        Ok(result)
    }

    async fn snapshot(&self, window: Option<&Window>) -> Result<LedgerSnapshot> {
        let range = window.map(Window::range);

        let mut expenses = self
            .stores
            .expenses
            .list(&ExpenseFilter {
                is_installment: Some(false),
                created_at: range,
                category: None,
            })
            .await?;
        // Installment expenses count by payment date, so their own creation
        // date is not filtered.
        expenses.extend(
            self.stores
                .expenses
                .list(&ExpenseFilter {
                    is_installment: Some(true),
                    ..Default::default()
                })
                .await?,
        );

        let installment_payments = self
            .stores
            .installments
            .list(&InstallmentPaymentFilter {
                expense_id: None,
                paid_at: range,
            })
            .await?;

        let transfers = self
            .stores
            .transfers
            .list(&TransferFilter { created_at: range })
            .await?;

        Ok(LedgerSnapshot {
            expenses,
            installment_payments,
            transfers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::expense::SplitType;
    use crate::domain::money::{Amount, Percentage};
    use crate::domain::ports::TransferStore;
    use crate::domain::transfer::TransferId;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn config() -> SplitConfig {
        SplitConfig::new("Ana", "Beto", Percentage::HALF)
    }

    fn expense(id: ExpenseId, amount: Decimal, paid_by: &str, created_at: &str) -> Expense {
        Expense {
            id,
            description: format!("expense {id}"),
            amount: Amount::new(amount).unwrap(),
            paid_by: paid_by.to_string(),
            category: None,
            split_type: SplitType::Default,
            custom_percentage: None,
            is_installment: false,
            total_installments: None,
            installment_payer: None,
            created_at: ts(created_at),
        }
    }

    fn installment_expense(id: ExpenseId, amount: Decimal, total: u32, payer: &str) -> Expense {
        Expense {
            is_installment: true,
            total_installments: Some(total),
            installment_payer: Some(payer.to_string()),
            ..expense(id, amount, payer, "2023-12-20 10:00:00")
        }
    }

    fn paid(id: u32, expense_id: ExpenseId, number: u32, paid_at: &str) -> InstallmentPayment {
        InstallmentPayment {
            id,
            expense_id,
            installment_number: number,
            paid_at: ts(paid_at),
        }
    }

    fn transfer(id: TransferId, from: &str, to: &str, amount: Decimal, at: &str) -> Transfer {
        Transfer {
            id,
            from_person: from.to_string(),
            to_person: to.to_string(),
            amount: Amount::new(amount).unwrap(),
            description: None,
            created_at: ts(at),
        }
    }

    fn snapshot(expenses: Vec<Expense>) -> LedgerSnapshot {
        LedgerSnapshot {
            expenses,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_split_paid_by_person2() {
        let snap = snapshot(vec![expense(1, dec!(100), "Beto", "2024-03-10 12:00:00")]);
        let result = calculate_balance(&config(), &snap, None);

        assert_eq!(result.person1_owes, dec!(50));
        assert_eq!(result.person2_owes, dec!(0));
        assert_eq!(result.net_balance, dec!(50));
        assert_eq!(result.who_owes, WhoOwes::Person1);
        assert_eq!(result.amount, dec!(50));
    }

    #[test]
    fn test_transfer_settles_debt() {
        let mut snap = snapshot(vec![expense(1, dec!(100), "Beto", "2024-03-10 12:00:00")]);
        snap.transfers
            .push(transfer(1, "Ana", "Beto", dec!(50), "2024-03-11 12:00:00"));
        let result = calculate_balance(&config(), &snap, None);

        assert_eq!(result.person1_paid, dec!(50));
        assert_eq!(result.net_balance, dec!(0));
        assert_eq!(result.who_owes, WhoOwes::Even);
        assert_eq!(result.amount, dec!(0));
    }

    #[test]
    fn test_installment_counts_in_month_it_was_paid() {
        let snap = LedgerSnapshot {
            expenses: vec![installment_expense(1, dec!(120), 3, "Ana")],
            installment_payments: vec![paid(1, 1, 1, "2024-03-05 08:00:00")],
            transfers: vec![],
        };

        let march = Window::new(3, 2024).unwrap();
        let result = calculate_balance(&config(), &snap, Some(&march));
        assert_eq!(result.person2_owes, dec!(20));
        assert_eq!(result.who_owes, WhoOwes::Person2);
        assert_eq!(result.amount, dec!(20));

        let april = Window::new(4, 2024).unwrap();
        let result = calculate_balance(&config(), &snap, Some(&april));
        assert_eq!(result.person2_owes, dec!(0));
        assert_eq!(result.who_owes, WhoOwes::Even);
    }

    #[test]
    fn test_custom_split_only_feeds_non_payer() {
        let mut custom = expense(1, dec!(200), "Beto", "2024-03-10 12:00:00");
        custom.split_type = SplitType::Custom;
        custom.custom_percentage = Some(Percentage::new(30).unwrap());

        let result = calculate_balance(&config(), &snapshot(vec![custom]), None);
        assert_eq!(result.person1_owes, dec!(60));
        assert_eq!(result.person2_owes, dec!(0));
        assert_eq!(result.amount, dec!(60));
    }

    #[test]
    fn test_payer_only_never_contributes() {
        let mut solo = expense(1, dec!(999.99), "Ana", "2024-03-10 12:00:00");
        solo.split_type = SplitType::PayerOnly;
        let mut solo_installment = installment_expense(2, dec!(300), 3, "Beto");
        solo_installment.split_type = SplitType::PayerOnly;

        let snap = LedgerSnapshot {
            expenses: vec![solo, solo_installment],
            installment_payments: vec![paid(1, 2, 1, "2024-03-01 00:00:00")],
            transfers: vec![],
        };
        let result = calculate_balance(&config(), &snap, None);
        assert_eq!(result.person1_owes, dec!(0));
        assert_eq!(result.person2_owes, dec!(0));
        assert_eq!(result.who_owes, WhoOwes::Even);
    }

    #[test]
    fn test_window_boundaries_are_inclusive() {
        let snap = LedgerSnapshot {
            expenses: vec![
                expense(1, dec!(10), "Beto", "2024-03-01 00:00:00"),
                expense(2, dec!(20), "Beto", "2024-03-31 23:59:59"),
                expense(3, dec!(40), "Beto", "2024-02-29 23:59:59"),
                expense(4, dec!(80), "Beto", "2024-04-01 00:00:00"),
            ],
            installment_payments: vec![],
            transfers: vec![
                transfer(1, "Ana", "Beto", dec!(1), "2024-03-31 23:59:59"),
                transfer(2, "Ana", "Beto", dec!(2), "2024-04-01 00:00:00"),
            ],
        };
        let march = Window::new(3, 2024).unwrap();
        let result = calculate_balance(&config(), &snap, Some(&march));

        assert_eq!(result.person1_owes, dec!(15));
        assert_eq!(result.person1_paid, dec!(1));
        assert_eq!(result.net_balance, dec!(14));
    }

    #[test]
    fn test_even_dead_zone() {
        // 50% of 0.0198 leaves a net balance of 0.0099.
        let snap = snapshot(vec![expense(1, dec!(0.0198), "Beto", "2024-03-10 12:00:00")]);
        let result = calculate_balance(&config(), &snap, None);
        assert_eq!(result.who_owes, WhoOwes::Even);
        assert_eq!(result.amount, dec!(0));

        // 50% of 0.02 leaves exactly 0.01.
        let snap = snapshot(vec![expense(1, dec!(0.02), "Beto", "2024-03-10 12:00:00")]);
        let result = calculate_balance(&config(), &snap, None);
        assert_eq!(result.who_owes, WhoOwes::Person1);
        assert_eq!(result.amount, dec!(0.01));

        let snap = snapshot(vec![expense(1, dec!(0.02), "Ana", "2024-03-10 12:00:00")]);
        let result = calculate_balance(&config(), &snap, None);
        assert_eq!(result.who_owes, WhoOwes::Person2);
        assert_eq!(result.net_balance, dec!(-0.01));
        assert_eq!(result.amount, dec!(0.01));
    }

    #[test]
    fn test_rounding_happens_once_at_the_end() {
        // Three half-cent shares: 0.015 overall, which rounds up to 0.02.
        // Rounding each record first would report 0.03.
        let snap = snapshot(
            (1..=3)
                .map(|id| expense(id, dec!(0.01), "Beto", "2024-03-10 12:00:00"))
                .collect(),
        );
        let result = calculate_balance(&config(), &snap, None);
        assert_eq!(result.person1_owes, dec!(0.02));
        assert_eq!(result.amount, dec!(0.02));
    }

    #[test]
    fn test_thirds_do_not_drift() {
        let snap = LedgerSnapshot {
            expenses: vec![installment_expense(1, dec!(100), 3, "Beto")],
            installment_payments: (1..=3)
                .map(|n| paid(n, 1, n, "2024-03-05 08:00:00"))
                .collect(),
            transfers: vec![],
        };
        let result = calculate_balance(&config(), &snap, None);
        assert_eq!(result.person1_owes, dec!(50));
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let snap = LedgerSnapshot {
            expenses: vec![expense(1, dec!(100), "Carla", "2024-03-10 12:00:00")],
            installment_payments: vec![],
            transfers: vec![
                transfer(1, "Carla", "Beto", dec!(30), "2024-03-10 12:00:00"),
                transfer(2, "Ana", "Ana", dec!(30), "2024-03-10 12:00:00"),
            ],
        };
        let result = calculate_balance(&config(), &snap, None);
        assert_eq!(result.person1_owes, dec!(0));
        assert_eq!(result.person1_paid, dec!(0));
        assert_eq!(result.person2_paid, dec!(0));
        assert_eq!(result.who_owes, WhoOwes::Even);
    }

    #[test]
    fn test_names_match_case_insensitively() {
        let mut snap = snapshot(vec![expense(1, dec!(100), "ANA", "2024-03-10 12:00:00")]);
        snap.transfers
            .push(transfer(1, "beto", "ana", dec!(20), "2024-03-10 12:00:00"));
        let result = calculate_balance(&config(), &snap, None);

        assert_eq!(result.person2_owes, dec!(50));
        assert_eq!(result.person2_paid, dec!(20));
        assert_eq!(result.net_balance, dec!(-30));
        assert_eq!(result.who_owes, WhoOwes::Person2);
    }

    #[test]
    fn test_payments_for_unknown_or_regular_expenses_are_ignored() {
        let snap = LedgerSnapshot {
            expenses: vec![expense(1, dec!(100), "Beto", "2020-01-01 00:00:00")],
            installment_payments: vec![
                paid(1, 1, 1, "2024-03-05 08:00:00"),
                paid(2, 42, 1, "2024-03-05 08:00:00"),
            ],
            transfers: vec![],
        };
        let march = Window::new(3, 2024).unwrap();
        let result = calculate_balance(&config(), &snap, Some(&march));
        assert_eq!(result.person1_owes, dec!(0));
    }

    #[test]
    fn test_installment_without_payer_accrues_nothing() {
        let mut orphan = installment_expense(1, dec!(90), 3, "Ana");
        orphan.installment_payer = None;
        let snap = LedgerSnapshot {
            expenses: vec![orphan],
            installment_payments: vec![paid(1, 1, 1, "2024-03-05 08:00:00")],
            transfers: vec![],
        };
        let result = calculate_balance(&config(), &snap, None);
        assert_eq!(result.person1_owes + result.person2_owes, dec!(0));
    }

    mod engine {
        use super::*;
        use crate::domain::ports::SettingsStore;
        use crate::infrastructure::in_memory::{
            InMemoryExpenseStore, InMemoryFixedExpenseStore, InMemoryInstallmentPaymentStore,
            InMemorySettingsStore,
        };

        struct UnreachableTransfers;

        #[async_trait]
        impl TransferStore for UnreachableTransfers {
            async fn store(&self, _transfer: Transfer) -> Result<()> {
                Ok(())
            }

            async fn get(&self, _id: TransferId) -> Result<Option<Transfer>> {
                Ok(None)
            }

            async fn delete(&self, _id: TransferId) -> Result<bool> {
                Ok(false)
            }

            async fn list(&self, _filter: &TransferFilter) -> Result<Vec<Transfer>> {
                Err(LedgerError::upstream(std::io::Error::other(
                    "connection reset",
                )))
            }
        }

        #[tokio::test]
        async fn test_missing_configuration() {
            let engine = BalanceEngine::new(Arc::new(LedgerStores::in_memory()));
            let result = engine.compute_balance(None).await;
            assert!(matches!(result, Err(LedgerError::ConfigurationMissing)));
        }

        #[tokio::test]
        async fn test_reads_snapshot_through_ports() {
            let stores = LedgerStores::in_memory();
            stores.settings.store(config()).await.unwrap();
            stores
                .expenses
                .store(expense(1, dec!(100), "Beto", "2024-03-10 12:00:00"))
                .await
                .unwrap();
            // Created long before March; counts only through its payment.
            stores
                .expenses
                .store(installment_expense(2, dec!(120), 3, "Ana"))
                .await
                .unwrap();
            stores
                .installments
                .store(paid(1, 2, 1, "2024-03-05 08:00:00"))
                .await
                .unwrap();
            stores
                .installments
                .store(paid(2, 2, 2, "2024-04-05 08:00:00"))
                .await
                .unwrap();

            let engine = BalanceEngine::new(Arc::new(stores));
            let march = engine
                .compute_balance(Some(Window::new(3, 2024).unwrap()))
                .await
                .unwrap();
            assert_eq!(march.person1_owes, dec!(50));
            assert_eq!(march.person2_owes, dec!(20));
            assert_eq!(march.net_balance, dec!(30));

            let all_time = engine.compute_balance(None).await.unwrap();
            assert_eq!(all_time.person2_owes, dec!(40));
            assert_eq!(all_time.net_balance, dec!(10));
        }

        #[tokio::test]
        async fn test_repeated_computation_is_identical() {
            let stores = LedgerStores::in_memory();
            stores.settings.store(config()).await.unwrap();
            for id in 1..=20 {
                let payer = if id % 3 == 0 { "Ana" } else { "Beto" };
                stores
                    .expenses
                    .store(expense(id, Decimal::from(id) / dec!(7), payer, "2024-03-10 12:00:00"))
                    .await
                    .unwrap();
            }
            let engine = BalanceEngine::new(Arc::new(stores));

            let first = engine.compute_balance(None).await.unwrap();
            let second = engine.compute_balance(None).await.unwrap();
            assert_eq!(first, second);
        }

        #[tokio::test]
        async fn test_store_failure_aborts_computation() {
            let settings = InMemorySettingsStore::new();
            settings.store(config()).await.unwrap();
            let stores = LedgerStores {
                settings: Box::new(settings),
                expenses: Box::new(InMemoryExpenseStore::new()),
                installments: Box::new(InMemoryInstallmentPaymentStore::new()),
                transfers: Box::new(UnreachableTransfers),
                fixed_expenses: Box::new(InMemoryFixedExpenseStore::new()),
            };

            let engine = BalanceEngine::new(Arc::new(stores));
            let result = engine.compute_balance(None).await;
            assert!(matches!(result, Err(LedgerError::Upstream(_))));
        }
    }
}
