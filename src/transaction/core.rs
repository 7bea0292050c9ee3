//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, auth::UserID};

/// The type given to transactions recorded without one.
pub const DEFAULT_TRANSACTION_TYPE: &str = "financial_data";

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// A signed amount of money recorded by a user, e.g. the net profit of a period.
///
/// To create a new `Transaction`, use [NewTransaction] and [record_transaction].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// A free-form tag for grouping transactions, e.g. "financial_data".
    pub transaction_type: String,
    /// The amount of money. Positive values are income, negative values are losses.
    pub amount: f64,
    /// When the transaction happened, in UTC.
    pub transaction_date: OffsetDateTime,
}

/// A transaction that has not been recorded yet.
///
/// # Examples
///
/// ```ignore
/// let transaction = NewTransaction::new(user_id, 80.0)
///     .transaction_type("rent")
///     .transaction_date(Some(datetime!(2025-03-01 09:00 UTC)));
/// let transaction = record_transaction(transaction, &connection)?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    /// The user recording the transaction.
    pub user_id: UserID,

    /// Defaults to [DEFAULT_TRANSACTION_TYPE].
    pub transaction_type: String,

    /// The signed amount, must be finite.
    pub amount: f64,

    /// When the transaction happened. `None` means the time it is recorded.
    pub transaction_date: Option<OffsetDateTime>,
}

impl NewTransaction {
    /// Start a new transaction for `user_id` with the default type and date.
    pub fn new(user_id: UserID, amount: f64) -> Self {
        Self {
            user_id,
            transaction_type: DEFAULT_TRANSACTION_TYPE.to_owned(),
            amount,
            transaction_date: None,
        }
    }

    /// Set the transaction type. Blank types keep the default.
    pub fn transaction_type(mut self, transaction_type: &str) -> Self {
        let transaction_type = transaction_type.trim();

        if !transaction_type.is_empty() {
            self.transaction_type = transaction_type.to_owned();
        }

        self
    }

    /// Set the date of the transaction, `None` uses the time it is recorded.
    pub fn transaction_date(mut self, transaction_date: Option<OffsetDateTime>) -> Self {
        self.transaction_date = transaction_date;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Record a new transaction in the database.
///
/// The date is converted to UTC before it is stored.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is NaN or infinite,
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn record_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if !new_transaction.amount.is_finite() {
        return Err(Error::InvalidAmount("Amount".to_owned()));
    }

    let transaction_date = new_transaction
        .transaction_date
        .unwrap_or_else(OffsetDateTime::now_utc)
        .to_offset(UtcOffset::UTC);

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, transaction_type, amount, transaction_date)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, user_id, transaction_type, amount, transaction_date",
        )?
        .query_row(
            (
                new_transaction.user_id.as_i64(),
                &new_transaction.transaction_type,
                new_transaction.amount,
                transaction_date,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })?;

    tracing::info!(
        "Recorded transaction {} of {} for user {}",
        transaction.id,
        transaction.amount,
        transaction.user_id
    );

    Ok(transaction)
}

/// Get the transactions recorded by `user_id` in the order they were recorded.
///
/// Only transactions with a type equal to `transaction_type` are returned if it is given.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    user_id: UserID,
    transaction_type: Option<&str>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let user_id = user_id.as_i64();

    match transaction_type {
        Some(transaction_type) => connection
            .prepare(
                "SELECT id, user_id, transaction_type, amount, transaction_date
                 FROM \"transaction\"
                 WHERE user_id = :user_id AND transaction_type = :transaction_type
                 ORDER BY id ASC",
            )?
            .query_map(
                rusqlite::named_params! {
                    ":user_id": user_id,
                    ":transaction_type": transaction_type,
                },
                map_transaction_row,
            )?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect(),
        None => connection
            .prepare(
                "SELECT id, user_id, transaction_type, amount, transaction_date
                 FROM \"transaction\"
                 WHERE user_id = :user_id
                 ORDER BY id ASC",
            )?
            .query_map(&[(":user_id", &user_id)], map_transaction_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect(),
    }
}

/// Get the number of transactions recorded by `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1;",
        [user_id.as_i64()],
        |row| row.get(0),
    )?;

    Ok(count as usize)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                transaction_type TEXT NOT NULL DEFAULT 'financial_data',
                amount REAL NOT NULL,
                transaction_date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    // Used by the history table on the finance page.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_type ON \"transaction\"(user_id, transaction_type);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let transaction_type = row.get(2)?;
    let amount = row.get(3)?;
    let transaction_date = row.get(4)?;

    Ok(Transaction {
        id,
        user_id: UserID::new(user_id),
        transaction_type,
        amount,
        transaction_date,
    })
}

// ============================================================================
// TESTS
// ============================================================================
