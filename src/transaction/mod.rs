//! The transaction ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` builder
//! - Database functions for recording and listing transactions
//! - Parsing of the finance form and the route handlers for the finance page

mod core;
mod finance_page;
mod form;

pub use core::{
    DEFAULT_TRANSACTION_TYPE, NewTransaction, Transaction, count_transactions,
    create_transaction_table, list_transactions, record_transaction,
};
pub use finance_page::{get_finance_page, post_finance};
