//! Application layer orchestrating the ledger.
//!
//! `BalanceEngine` answers "who owes whom" from a read-only snapshot of the
//! stores, while `LedgerService` is the validated write path that keeps those
//! stores consistent. Both share the same `LedgerStores` handle.

pub mod balance;
pub mod ledger;
