use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    balance::{BalanceSummary, PeriodFilter, get_balance_summary},
    db::lock_connection,
};

/// The state needed to compute the balance.
#[derive(Debug, Clone)]
pub struct BalanceState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the balance. Kept as strings so that an invalid
/// number produces a JSON error rather than a plain text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    month: Option<String>,
    year: Option<String>,
}

/// A route handler that returns the balance summary for the requested period.
pub async fn get_balance_endpoint(
    State(state): State<BalanceState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceSummary>, Error> {
    let filter = PeriodFilter::parse(query.month.as_deref(), query.year.as_deref())?;
    let connection = lock_connection(&state.db_connection)?;

    get_balance_summary(&filter, &connection).map(Json)
}
