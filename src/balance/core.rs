//! Computes a user's balance, income and expense totals from their transactions.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, user::UserID};

/// The totals of a user's transactions.
///
/// `expense` keeps the sign of the stored amounts, so it is never positive and
/// `balance == income + expense`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// The sum of all transaction amounts.
    pub balance: f64,
    /// The sum of the positive transaction amounts.
    pub income: f64,
    /// The sum of the negative transaction amounts.
    pub expense: f64,
}

/// Get the balance, income and expense totals for `user_id`.
///
/// All three totals are zero for a user without transactions.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query preparation or execution fails.
pub fn get_balance(user_id: UserID, connection: &Connection) -> Result<BalanceSummary, Error> {
    let mut stmt = connection.prepare(
        "SELECT
            COALESCE(SUM(amount), 0.0),
            COALESCE(SUM(CASE WHEN amount > 0 THEN amount END), 0.0),
            COALESCE(SUM(CASE WHEN amount < 0 THEN amount END), 0.0)
        FROM \"transaction\"
        WHERE user_id = :user_id",
    )?;

    let summary = stmt.query_row(&[(":user_id", &user_id.as_i64())], |row| {
        Ok(BalanceSummary {
            balance: row.get(0)?,
            income: row.get(1)?,
            expense: row.get(2)?,
        })
    })?;

    Ok(summary)
}

#[cfg(test)]
mod get_balance_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        PasswordHash,
        db::initialize,
        transaction::{MAX_AMOUNT, Transaction, TransactionKind, create_transaction},
        user::{Email, User, UserID, Username, create_user},
    };

    use super::{BalanceSummary, get_balance};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(name: &str, conn: &Connection) -> User {
        create_user(
            Username::new_unchecked(name),
            Email::new_unchecked(&format!("{name}@example.com")),
            PasswordHash::new_unchecked("hunter2"),
            conn,
        )
        .expect("Could not create test user")
    }

    fn insert(amount: f64, kind: TransactionKind, user_id: UserID, conn: &Connection) {
        let builder = Transaction::build(amount, date!(2025 - 10 - 05), "Misc").kind(kind);
        create_transaction(builder.finalise().unwrap(), user_id, conn)
            .expect("Could not create transaction");
    }

    #[test]
    fn returns_zero_without_transactions() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);

        let summary = get_balance(user.id, &conn).unwrap();

        assert_eq!(
            summary,
            BalanceSummary {
                balance: 0.0,
                income: 0.0,
                expense: 0.0
            }
        );
    }

    #[test]
    fn sums_income_and_expenses() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        insert(100.0, TransactionKind::Income, user.id, &conn);
        insert(30.0, TransactionKind::Expense, user.id, &conn);
        insert(50.0, TransactionKind::Income, user.id, &conn);

        let summary = get_balance(user.id, &conn).unwrap();

        assert_eq!(
            summary,
            BalanceSummary {
                balance: 120.0,
                income: 150.0,
                expense: -30.0
            }
        );
    }

    #[test]
    fn only_expenses_gives_zero_income() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        insert(12.5, TransactionKind::Expense, user.id, &conn);
        insert(7.5, TransactionKind::Expense, user.id, &conn);

        let summary = get_balance(user.id, &conn).unwrap();

        assert_eq!(summary.income, 0.0);
        assert_eq!(summary.expense, -20.0);
        assert_eq!(summary.balance, -20.0);
    }

    #[test]
    fn ignores_other_users_transactions() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let bob = create_test_user("bob", &conn);
        insert(100.0, TransactionKind::Income, alice.id, &conn);
        insert(40.0, TransactionKind::Expense, bob.id, &conn);

        let summary = get_balance(alice.id, &conn).unwrap();

        assert_eq!(
            summary,
            BalanceSummary {
                balance: 100.0,
                income: 100.0,
                expense: 0.0
            }
        );
    }

    #[test]
    fn totals_stay_finite_at_maximum_amounts() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        for _ in 0..3 {
            insert(MAX_AMOUNT, TransactionKind::Income, user.id, &conn);
            insert(MAX_AMOUNT, TransactionKind::Expense, user.id, &conn);
        }

        let summary = get_balance(user.id, &conn).unwrap();
        let json = serde_json::to_value(summary).unwrap();

        assert!(summary.income.is_finite());
        assert!(summary.expense.is_finite());
        assert!(json["income"].is_f64());
        assert!(json["balance"].is_f64());
    }
}
