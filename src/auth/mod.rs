//! User authentication: registration, log-in and log-out, and the cookie based
//! session that guards the protected routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod register_user;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{LogInData, post_log_in, verify_credentials};
pub use log_out::post_log_out;
pub use middleware::{AuthState, auth_guard};
pub use register_user::{RegisterForm, register, register_user};
pub use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
