//! Application router configuration.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::{log_in_endpoint, log_out_endpoint, session_endpoint},
    balance::get_balance_endpoint,
    db::lock_connection,
    endpoints,
    gateway::{
        create_endpoint, delete_endpoint, get_row_endpoint, list_endpoint, update_endpoint,
    },
    otp::{send_otp_endpoint, verify_otp_endpoint},
    setting::{get_setting_endpoint, upsert_setting_endpoint},
};

/// Return a router with all the app's routes.
///
/// The fixed routes take precedence over `/api/{table}`, so e.g. `/api/balance`
/// never reaches the table endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::SEND_OTP, post(send_otp_endpoint))
        .route(endpoints::VERIFY_OTP, post(verify_otp_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(endpoints::LOG_OUT, post(log_out_endpoint))
        .route(endpoints::SESSION, get(session_endpoint))
        .route(endpoints::BALANCE, get(get_balance_endpoint))
        .route(endpoints::SETTINGS, post(upsert_setting_endpoint))
        .route(endpoints::SETTING, get(get_setting_endpoint))
        .route(endpoints::TABLE, get(list_endpoint).post(create_endpoint))
        .route(
            endpoints::TABLE_ROW,
            get(get_row_endpoint)
                .put(update_endpoint)
                .delete(delete_endpoint),
        )
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Check that the server is up and can reach the database.
async fn get_health(State(state): State<AppState>) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let time: String = connection.query_row("SELECT CURRENT_TIMESTAMP", [], |row| row.get(0))?;

    Ok(Json(json!({ "success": true, "time": time })))
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
