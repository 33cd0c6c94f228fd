//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::TransactionId,
    user::{UserID, validate_text_field},
};

// ============================================================================
// MODELS
// ============================================================================

/// The maximum number of characters in a category label.
pub const MAX_CATEGORY_LENGTH: usize = 50;

/// The largest amount a single transaction may record, in dollars.
pub const MAX_AMOUNT: f64 = 99_999_999.99;

pub(crate) mod date_format {
    //! Serializes a [time::Date] as "YYYY-MM-DD".
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    /// Date format for transactions, e.g. "2025-01-15".
    pub(crate) const DATE_FORMAT: &[BorrowedFormatItem] =
        format_description!("[year]-[month]-[day]");

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = date
            .format(DATE_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Whether money was earned or spent.
///
/// The kind only decides the sign of the stored amount, it is not stored itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, stored as a positive amount.
    Income,
    /// Money spent, stored as a negative amount.
    #[default]
    Expense,
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    #[serde(skip)]
    pub user_id: Option<UserID>,
    /// The signed amount of money, positive for income and negative for expenses.
    pub amount: f64,
    /// When the transaction happened.
    #[serde(with = "date_format")]
    pub date: Date,
    /// A free-text label describing what the transaction was for.
    pub category: String,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, date: Date, category: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            category: category.to_owned(),
            kind: TransactionKind::default(),
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// let salary = Transaction::build(2500.0, date!(2025-01-15), "Salary")
///     .kind(TransactionKind::Income)
///     .finalise()?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The unsigned amount of money earned or spent.
    ///
    /// Must be a finite number greater than zero, the sign comes from `kind`.
    pub amount: f64,

    /// The date when the transaction occurred.
    pub date: Date,

    /// A free-text label such as "Groceries" or "Salary".
    ///
    /// Surrounding whitespace is removed and the label must not be empty.
    pub category: String,

    /// Whether the amount was earned or spent. Defaults to an expense.
    pub kind: TransactionKind,
}

impl TransactionBuilder {
    /// Set whether the transaction is income or an expense.
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Validate the builder and produce the values to insert into the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if the amount is zero, negative, not finite or
    ///   greater than [MAX_AMOUNT],
    /// - [Error::MissingField] if the category is empty,
    /// - or [Error::FieldTooLong] if the category is longer than [MAX_CATEGORY_LENGTH].
    pub fn finalise(self) -> Result<ValidatedTransaction, Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 || self.amount > MAX_AMOUNT {
            return Err(Error::InvalidAmount(self.amount));
        }

        let category = validate_text_field(&self.category, "category", MAX_CATEGORY_LENGTH)?;

        let signed_amount = match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        };

        Ok(ValidatedTransaction {
            amount: signed_amount,
            date: self.date,
            category,
        })
    }
}

/// A transaction that has passed validation but has not been saved yet.
#[derive(Debug, PartialEq, Clone)]
pub struct ValidatedTransaction {
    amount: f64,
    date: Date,
    category: String,
}

impl ValidatedTransaction {
    /// The signed amount that will be stored.
    pub fn amount(&self) -> f64 {
        self.amount
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction owned by `user_id` in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::UnknownUser] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    transaction: ValidatedTransaction,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, amount, date, category)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, user_id, amount, date, category",
        )?
        .query_row(
            (
                user_id.as_i64(),
                transaction.amount,
                transaction.date,
                transaction.category,
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
            ) => Error::UnknownUser,
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Get all of the transactions owned by `user_id`.
///
/// Transactions are sorted by date with the most recent first. Transactions on
/// the same date are sorted with the most recently created first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, amount, date, category FROM \"transaction\"
             WHERE user_id = :user_id
             ORDER BY date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the transaction list and the balance queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let amount = row.get(2)?;
    let date = row.get(3)?;
    let category = row.get(4)?;

    Ok(Transaction {
        id,
        user_id: Some(user_id),
        amount,
        date,
        category,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod builder_tests {
    use time::macros::date;

    use crate::{
        Error,
        transaction::{Transaction, TransactionKind},
    };

    use super::{MAX_AMOUNT, MAX_CATEGORY_LENGTH};

    #[test]
    fn expense_amount_is_negative() {
        let transaction = Transaction::build(30.0, date!(2025 - 10 - 05), "Groceries")
            .finalise()
            .unwrap();

        assert_eq!(transaction.amount(), -30.0);
    }

    #[test]
    fn income_amount_is_positive() {
        let transaction = Transaction::build(100.0, date!(2025 - 10 - 05), "Salary")
            .kind(TransactionKind::Income)
            .finalise()
            .unwrap();

        assert_eq!(transaction.amount(), 100.0);
    }

    #[test]
    fn zero_amount_fails() {
        let result = Transaction::build(0.0, date!(2025 - 10 - 05), "Groceries").finalise();

        assert_eq!(result, Err(Error::InvalidAmount(0.0)));
    }

    #[test]
    fn negative_amount_fails() {
        let result = Transaction::build(-12.0, date!(2025 - 10 - 05), "Groceries")
            .kind(TransactionKind::Income)
            .finalise();

        assert_eq!(result, Err(Error::InvalidAmount(-12.0)));
    }

    #[test]
    fn non_finite_amount_fails() {
        for amount in [f64::INFINITY, f64::NEG_INFINITY] {
            let result = Transaction::build(amount, date!(2025 - 10 - 05), "Groceries").finalise();

            assert_eq!(result, Err(Error::InvalidAmount(amount)));
        }

        let result = Transaction::build(f64::NAN, date!(2025 - 10 - 05), "Groceries").finalise();
        assert!(matches!(result, Err(Error::InvalidAmount(amount)) if amount.is_nan()));
    }

    #[test]
    fn amount_above_maximum_fails() {
        for amount in [MAX_AMOUNT + 1.0, 1.7e308] {
            let result = Transaction::build(amount, date!(2025 - 10 - 05), "Lottery")
                .kind(TransactionKind::Income)
                .finalise();

            assert_eq!(result, Err(Error::InvalidAmount(amount)));
        }
    }

    #[test]
    fn maximum_amount_succeeds() {
        let transaction = Transaction::build(MAX_AMOUNT, date!(2025 - 10 - 05), "Lottery")
            .kind(TransactionKind::Income)
            .finalise()
            .unwrap();

        assert_eq!(transaction.amount(), MAX_AMOUNT);
    }

    #[test]
    fn blank_category_fails() {
        let result = Transaction::build(1.0, date!(2025 - 10 - 05), "  ").finalise();

        assert_eq!(result, Err(Error::MissingField("category")));
    }

    #[test]
    fn long_category_fails() {
        let category = "x".repeat(MAX_CATEGORY_LENGTH + 1);

        let result = Transaction::build(1.0, date!(2025 - 10 - 05), &category).finalise();

        assert_eq!(
            result,
            Err(Error::FieldTooLong {
                field: "category",
                max_length: MAX_CATEGORY_LENGTH
            })
        );
    }
}
