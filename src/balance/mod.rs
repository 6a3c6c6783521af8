//! The society's running balance: the opening balance plus collections minus
//! expenses, optionally restricted to a month and/or year.

mod core;
mod endpoint;

pub use core::{BalanceSummary, PeriodFilter, get_balance_summary};
pub use endpoint::get_balance_endpoint;
