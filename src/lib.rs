//! A personal expense tracker.
//!
//! Users register, log in with a cookie based session, record income and
//! expenses, and view their balance.
//!
//! This library provides a JSON REST API backed by SQLite.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod balance;
mod database_id;
mod db;
mod endpoints;
mod error;
mod logging;
mod password;
mod routing;
mod transaction;
mod user;

pub use app_state::{AppState, create_cookie_key};
pub use auth::{
    AuthState, DEFAULT_COOKIE_DURATION, LogInData, RegisterForm, Token, register,
    verify_credentials,
};
pub use balance::{BalanceSummary, get_balance};
pub use database_id::{DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use error::{Error, INTERNAL_ERROR_MESSAGE};
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use transaction::{
    MAX_AMOUNT, Transaction, TransactionBuilder, TransactionForm, TransactionKind,
    ValidatedTransaction, add_transaction, create_transaction, get_transactions_by_user,
};
pub use user::{Email, User, UserID, Username, create_user, get_user_by_username};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
