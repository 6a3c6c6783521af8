//! Admin log-in, log-out and the session summary.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, State},
};
use axum_extra::extract::PrivateCookieJar;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Deserialize;
use serde_json::{Value, json};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{PasswordHash, Role, Viewer, invalidate_session_cookie, set_session_cookie},
    db::lock_connection,
    json_body::parse_json_body,
};

pub fn create_admin_credential_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS admin_credential (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            password TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Store `password_hash` as the admin password, replacing any previous one.
pub fn set_admin_password(
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO admin_credential (id, password) VALUES (1, ?1)
        ON CONFLICT(id) DO UPDATE SET password = excluded.password",
        params![password_hash.to_string()],
    )?;

    Ok(())
}

/// # Errors
/// Returns [Error::NotFound] if no admin password has been set.
pub fn get_admin_password_hash(connection: &Connection) -> Result<PasswordHash, Error> {
    connection
        .query_row(
            "SELECT password FROM admin_credential WHERE id = 1",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .map(|hash| PasswordHash::new_unchecked(&hash))
        .ok_or_else(|| Error::NotFound("Admin password has not been set".to_owned()))
}

/// The state needed to log in as the admin.
#[derive(Debug, Clone)]
pub struct LogInState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// How long the admin session lasts.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct LogInData {
    #[serde(default)]
    password: String,
}

/// A route handler that starts an admin session if the password matches.
pub async fn log_in_endpoint(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    body: Bytes,
) -> Result<(PrivateCookieJar, Json<Value>), Error> {
    let data: LogInData = parse_json_body(&body)?;

    if data.password.is_empty() {
        return Err(Error::Validation("password is required".to_owned()));
    }

    let password_hash = {
        let connection = lock_connection(&state.db_connection)?;
        get_admin_password_hash(&connection)?
    };

    let is_match = password_hash
        .verify(&data.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_match {
        tracing::warn!("Rejected admin log-in with an incorrect password");
        return Err(Error::InvalidCredentials);
    }

    let jar = set_session_cookie(jar, Role::Admin, None, state.cookie_duration)?;
    tracing::info!("Admin logged in");

    Ok((jar, Json(json!({ "success": true, "message": "Logged in" }))))
}

/// A route handler that ends the caller's session.
pub async fn log_out_endpoint(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<Value>) {
    (invalidate_session_cookie(jar), Json(json!({ "success": true })))
}

/// A route handler that describes the caller's session.
pub async fn session_endpoint(viewer: Viewer) -> Json<Value> {
    Json(json!({ "role": viewer.role, "flatNo": viewer.flat_no }))
}
