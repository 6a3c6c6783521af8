use std::sync::{Arc, Mutex};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::Viewer,
    db::lock_connection,
    json_body::parse_json_body,
    setting::{Setting, SettingForm, get_setting, upsert_setting},
};

/// The state needed to read and write settings.
#[derive(Debug, Clone)]
pub struct SettingState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for reading a single setting.
pub async fn get_setting_endpoint(
    State(state): State<SettingState>,
    Path(key): Path<String>,
) -> Result<Json<Setting>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_setting(&key, &connection).map(Json)
}

/// A route handler for creating or replacing a setting. Admin only.
pub async fn upsert_setting_endpoint(
    State(state): State<SettingState>,
    viewer: Viewer,
    body: Bytes,
) -> Result<Json<Setting>, Error> {
    viewer.require_admin()?;
    let form: SettingForm = parse_json_body(&body)?;

    let connection = lock_connection(&state.db_connection)?;
    let setting = upsert_setting(&form, &connection)?;
    tracing::info!("Set {} to {}", setting.setting_key, setting.value);

    Ok(Json(setting))
}
