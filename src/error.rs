//! Defines the app level error type and its conversion to JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body could not be parsed as the expected JSON object.
    #[error("could not parse the request body: {0}")]
    InvalidRequestBody(String),

    /// A required field was missing or empty.
    #[error("the field \"{0}\" is required")]
    MissingField(&'static str),

    /// A text field was longer than the database allows.
    #[error("the field \"{field}\" must be at most {max_length} characters long")]
    FieldTooLong {
        /// The name of the offending field.
        field: &'static str,
        /// The maximum number of characters allowed.
        max_length: usize,
    },

    /// The email address is not a plausible email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// A transaction amount that is zero, negative, not finite or too large.
    #[error("the amount must be a positive number no greater than 99999999.99, got {0}")]
    InvalidAmount(f64),

    /// A transaction date that is not in the `YYYY-MM-DD` format.
    #[error("could not parse the date \"{0}\", expected the format YYYY-MM-DD")]
    InvalidDate(String),

    /// The username or email is already used by another user.
    #[error("a user with the same username or email already exists")]
    DuplicateUser,

    /// The username or password given at log-in did not match a registered user.
    ///
    /// Unknown usernames and wrong passwords both produce this error so that
    /// clients cannot tell which check failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The auth cookie is missing from the request, or it could not be
    /// decrypted with the server's key.
    #[error("the request does not carry a valid auth cookie")]
    NotAuthenticated,

    /// The auth cookie decrypted but its contents are not a valid token.
    #[error("the auth token is malformed")]
    InvalidToken,

    /// The auth token has passed its expiry time.
    #[error("the auth token has expired")]
    TokenExpired,

    /// The auth token refers to a user that does not exist.
    #[error("the auth token refers to a user that does not exist")]
    UnknownUser,

    /// The requested resource was not found.
    ///
    /// Internally, this error occurs when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The auth token could not be serialized.
    #[error("could not serialize the auth token: {0}")]
    TokenSerialization(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The message sent to clients in place of internal error details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

impl Error {
    /// The HTTP status code that the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRequestBody(_)
            | Error::MissingField(_)
            | Error::FieldTooLong { .. }
            | Error::InvalidEmail(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateUser => StatusCode::CONFLICT,
            Error::InvalidCredentials
            | Error::NotAuthenticated
            | Error::InvalidToken
            | Error::TokenExpired
            | Error::UnknownUser => StatusCode::UNAUTHORIZED,
            Error::NotFound
            | Error::HashingError(_)
            | Error::TokenSerialization(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client.
    fn client_message(&self) -> String {
        match self {
            Error::InvalidRequestBody(_) => "The request body is not valid JSON.".to_owned(),
            Error::MissingField(_) => "All fields are required.".to_owned(),
            Error::DuplicateUser => "User already exists.".to_owned(),
            Error::InvalidCredentials => "Invalid credentials.".to_owned(),
            Error::NotAuthenticated => "Unauthorized.".to_owned(),
            Error::InvalidToken | Error::UnknownUser => "Invalid token.".to_owned(),
            Error::TokenExpired => "Session expired, please log in again.".to_owned(),
            Error::FieldTooLong { .. }
            | Error::InvalidEmail(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_) => capitalize(&self.to_string()),
            Error::NotFound
            | Error::HashingError(_)
            | Error::TokenSerialization(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => INTERNAL_ERROR_MESSAGE.to_owned(),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>() + ".",
        None => String::new(),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            // Any errors that are not handled above are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
        } else {
            tracing::debug!("Rejecting request: {}", self);
        }

        (status, Json(json!({ "message": self.client_message() }))).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::Value;

    use super::{Error, INTERNAL_ERROR_MESSAGE};

    async fn get_message(error: Error) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();

        (status, json["message"].as_str().unwrap().to_owned())
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let (status, message) = get_message(Error::InvalidAmount(0.0)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            message,
            "The amount must be a positive number no greater than 99999999.99, got 0."
        );
    }

    #[tokio::test]
    async fn duplicate_user_is_conflict() {
        let (status, message) = get_message(Error::DuplicateUser).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "User already exists.");
    }

    #[tokio::test]
    async fn auth_errors_are_unauthorized() {
        for error in [
            Error::InvalidCredentials,
            Error::NotAuthenticated,
            Error::InvalidToken,
            Error::TokenExpired,
            Error::UnknownUser,
        ] {
            let (status, _) = get_message(error).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn store_errors_do_not_leak_details() {
        let (status, message) = get_message(Error::SqlError(
            rusqlite::Error::InvalidColumnName("secret_column".to_owned()),
        ))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}
