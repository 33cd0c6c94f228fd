//! Handles requests to create a new user account.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    user::{Email, User, Username, create_user, is_username_or_email_taken},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost used when hashing the new user's password.
    pub password_hash_cost: u32,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for registering a new user.
///
/// Missing fields deserialize to empty strings so that they are reported as missing rather than
/// as a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The new user's email address.
    #[serde(default)]
    pub email: String,
    /// The name the new user will log in with.
    #[serde(default)]
    pub username: String,
    /// The new user's password in plain text.
    #[serde(default)]
    pub password: String,
}

/// Create a new user from `form`.
///
/// A taken username or email is reported before the format of the fields is checked.
/// The database lock is released while the password is hashed, so a concurrent registration
/// can still win the race; the UNIQUE constraints then turn the insert into [Error::DuplicateUser].
///
/// # Errors
///
/// Returns a:
/// - [Error::MissingField] if any field is empty,
/// - [Error::DuplicateUser] if the username or email is already taken,
/// - [Error::FieldTooLong] or [Error::InvalidEmail] if a field is malformed,
/// - [Error::HashingError] if the password could not be hashed,
/// - [Error::DatabaseLockError] or [Error::SqlError] if the store could not be used.
pub fn register(
    form: &RegisterForm,
    password_hash_cost: u32,
    db_connection: &Mutex<Connection>,
) -> Result<User, Error> {
    let raw_email = form.email.trim();
    let raw_username = form.username.trim();

    if raw_email.is_empty() {
        return Err(Error::MissingField("email"));
    }

    if raw_username.is_empty() {
        return Err(Error::MissingField("username"));
    }

    let password = ValidatedPassword::new(&form.password)?;

    {
        let connection = db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        if is_username_or_email_taken(raw_username, raw_email, &connection)? {
            return Err(Error::DuplicateUser);
        }
    }

    let username = Username::new(raw_username)?;
    let email = Email::new(raw_email)?;
    let password_hash = PasswordHash::new(password, password_hash_cost)?;

    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_user(username, email, password_hash, &connection)
}

/// A route handler for creating a new user.
///
/// Responds with 201 Created on success. The new user is not logged in.
pub async fn register_user(
    State(state): State<RegistrationState>,
    form: Result<Json<RegisterForm>, JsonRejection>,
) -> Response {
    let Json(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Error::InvalidRequestBody(rejection.body_text()).into_response(),
    };

    match register(&form, state.password_hash_cost, &state.db_connection) {
        Ok(user) => {
            tracing::info!("Registered user {} with ID {}", user.username, user.id);

            (
                StatusCode::CREATED,
                Json(json!({ "message": "User created successfully." })),
            )
                .into_response()
        }
        Err(error) => error.into_response(),
    }
}
