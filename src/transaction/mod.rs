//! Transaction management for the expense tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and querying transactions
//! - Route handlers for adding and listing transactions

mod core;
mod create_endpoint;
mod transactions_endpoint;

pub use core::{
    MAX_AMOUNT, Transaction, TransactionBuilder, TransactionKind, ValidatedTransaction,
    create_transaction, create_transaction_table, get_transactions_by_user,
};
pub use create_endpoint::{TransactionForm, add_transaction, create_transaction_endpoint};
pub use transactions_endpoint::get_transactions_endpoint;
