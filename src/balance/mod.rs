//! Aggregates a user's transactions into a balance.

mod core;
mod endpoint;

pub use core::{BalanceSummary, get_balance};
pub use endpoint::get_balance_endpoint;
