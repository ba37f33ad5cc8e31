//! Ledger records, value objects and the store ports the application layer
//! depends on.

pub mod expense;
pub mod fixed_expense;
pub mod money;
pub mod period;
pub mod ports;
pub mod settings;
pub mod split;
pub mod transfer;
