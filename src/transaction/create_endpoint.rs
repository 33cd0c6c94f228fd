//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    transaction::{
        Transaction, TransactionKind,
        core::{create_transaction, date_format::DATE_FORMAT},
    },
    user::UserID,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating a transaction.
///
/// Fields are optional so that a missing field is reported as a missing field
/// rather than as a malformed body.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionForm {
    /// The magnitude of the transaction in dollars.
    #[serde(default)]
    pub amount: Option<f64>,
    /// The date when the transaction occurred, formatted as `YYYY-MM-DD`.
    #[serde(default, alias = "_date")]
    pub date: Option<String>,
    /// A free-text label for the transaction.
    #[serde(default)]
    pub category: String,
    /// Whether the money was earned or spent, defaults to an expense.
    #[serde(default)]
    pub kind: TransactionKind,
}

/// Validate `form` and store it as a new transaction owned by `user_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::MissingField] if the amount, date or category is missing,
/// - [Error::InvalidDate] if the date is not formatted as `YYYY-MM-DD`,
/// - [Error::InvalidAmount] if the amount is not a positive number or exceeds
///   [MAX_AMOUNT](crate::transaction::MAX_AMOUNT),
/// - [Error::UnknownUser] if `user_id` does not refer to a user,
/// - [Error::DatabaseLockError] or [Error::SqlError] if the store could not be used.
pub fn add_transaction(
    form: &TransactionForm,
    user_id: UserID,
    db_connection: &Mutex<Connection>,
) -> Result<TransactionId, Error> {
    let amount = form.amount.ok_or(Error::MissingField("amount"))?;
    let date = parse_date(form.date.as_deref())?;

    let transaction = Transaction::build(amount, date, &form.category)
        .kind(form.kind)
        .finalise()?;

    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_transaction(transaction, user_id, &connection).map(|transaction| transaction.id)
}

fn parse_date(raw_date: Option<&str>) -> Result<Date, Error> {
    let raw_date = raw_date
        .map(str::trim)
        .filter(|date| !date.is_empty())
        .ok_or(Error::MissingField("date"))?;

    Date::parse(raw_date, DATE_FORMAT).map_err(|_| Error::InvalidDate(raw_date.to_owned()))
}

/// A route handler for creating a new transaction.
///
/// Responds with 201 Created and the ID of the new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    form: Result<Json<TransactionForm>, JsonRejection>,
) -> Response {
    let Json(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Error::InvalidRequestBody(rejection.body_text()).into_response(),
    };

    match add_transaction(&form, user_id, &state.db_connection) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({ "message": "Transaction added successfully.", "id": id })),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}
