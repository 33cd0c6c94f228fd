//! This file defines the route for handling log-in requests.
//! The cookie module handles the lower level cookie auth logic.

use std::sync::{Arc, Mutex, OnceLock};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Duration;

use crate::{
    AppState, Error, PasswordHash,
    auth::set_auth_cookie,
    user::{User, get_user_by_username},
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
pub const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by a client logging in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogInData {
    /// The user's username.
    #[serde(default)]
    pub username: String,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: String,
    /// Whether the session should last for a week instead of the default duration.
    #[serde(default)]
    pub remember_me: bool,
}

/// Look up the user named in `credentials` and check their password.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if either field is empty, the username is unknown or the
/// password is wrong, so callers cannot tell these cases apart.
/// Returns [Error::DatabaseLockError], [Error::SqlError] or [Error::HashingError] for internal
/// failures.
pub fn verify_credentials(
    credentials: &LogInData,
    db_connection: &Mutex<Connection>,
) -> Result<User, Error> {
    let username = credentials.username.trim();

    if username.is_empty() || credentials.password.is_empty() {
        return Err(Error::InvalidCredentials);
    }

    let user = {
        let connection = db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_username(username, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::NotFound) => {
            verify_dummy_password(&credentials.password);
            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    let is_password_valid = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if is_password_valid {
        Ok(user)
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// Run bcrypt against a fixed hash so an unknown username costs as much as a
/// wrong password.
fn verify_dummy_password(raw_password: &str) {
    static DUMMY_PASSWORD_HASH: OnceLock<Option<PasswordHash>> = OnceLock::new();

    let dummy_hash = DUMMY_PASSWORD_HASH.get_or_init(|| {
        PasswordHash::from_raw_password("not a real password", PasswordHash::DEFAULT_COST).ok()
    });

    match dummy_hash {
        Some(hash) => {
            let _ = hash.verify(raw_password);
        }
        None => tracing::error!("Could not create the dummy password hash"),
    }
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and a confirmation message is returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username or password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    credentials: Result<Json<LogInData>, JsonRejection>,
) -> Response {
    let Json(credentials) = match credentials {
        Ok(credentials) => credentials,
        Err(rejection) => return Error::InvalidRequestBody(rejection.body_text()).into_response(),
    };

    let user = match verify_credentials(&credentials, &state.db_connection) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    let cookie_duration = if credentials.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    match set_auth_cookie(jar, user.id, cookie_duration) {
        Ok(jar) => {
            tracing::info!("User {} logged in", user.id);
            (jar, Json(json!({ "message": "Login successful" }))).into_response()
        }
        Err(error) => error.into_response(),
    }
}
