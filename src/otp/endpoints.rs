use std::sync::{Arc, Mutex};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, State},
};
use axum_extra::extract::PrivateCookieJar;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{Role, set_session_cookie},
    db::lock_connection,
    json_body::parse_json_body,
    mail::{Email, Mailer},
    otp::{delete_otps_for_flat, find_valid_otp, generate_code, insert_otp},
    owner::get_owner_email,
};

/// The state needed to issue and check OTPs.
#[derive(Clone)]
pub struct OtpState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub mailer: Arc<dyn Mailer>,
    /// How long the owner session lasts after a successful verification.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for OtpState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            mailer: state.mailer.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendOtpData {
    #[serde(default, rename = "flatNo")]
    flat_no: String,
}

#[derive(Debug, Deserialize)]
struct VerifyOtpData {
    #[serde(default, rename = "flatNo")]
    flat_no: String,
    /// Clients send the code either as a string or as a number.
    #[serde(default)]
    otp: Value,
}

/// A route handler that emails a new OTP to the owner of a flat.
///
/// The code is stored before the owner is looked up, so a code exists even
/// when the request fails because the owner has no email.
pub async fn send_otp_endpoint(
    State(state): State<OtpState>,
    body: Bytes,
) -> Result<Json<Value>, Error> {
    let data: SendOtpData = parse_json_body(&body)?;
    let flat_no = data.flat_no.trim();

    if flat_no.is_empty() {
        return Err(Error::Validation("flatNo is required".to_owned()));
    }

    let code = generate_code();
    let to = {
        let connection = lock_connection(&state.db_connection)?;
        insert_otp(flat_no, &code, OffsetDateTime::now_utc(), &connection)?;
        get_owner_email(flat_no, &connection)?
    };

    let email = Email::new(
        to,
        "Your OTP for the Society Portal",
        format!("Your OTP is {code}. It expires in 5 minutes."),
    )
    .with_html(format!(
        "<p>Your OTP is <b>{code}</b>. It expires in 5 minutes.</p>"
    ));

    state.mailer.send(&email).await.inspect_err(|error| {
        tracing::error!("Could not send OTP for flat {flat_no}: {error}");
    })?;
    tracing::info!("Sent OTP for flat {flat_no}");

    Ok(Json(
        json!({ "success": true, "message": "OTP sent to email" }),
    ))
}

/// A route handler that checks an OTP and starts an owner session.
///
/// On success every code issued for the flat is deleted.
pub async fn verify_otp_endpoint(
    State(state): State<OtpState>,
    jar: PrivateCookieJar,
    body: Bytes,
) -> Result<(PrivateCookieJar, Json<Value>), Error> {
    let data: VerifyOtpData = parse_json_body(&body)?;
    let flat_no = data.flat_no.trim();
    let code = match &data.otp {
        Value::String(code) => code.trim().to_owned(),
        Value::Number(code) => code.to_string(),
        _ => String::new(),
    };

    if flat_no.is_empty() || code.is_empty() {
        return Err(Error::Validation("flatNo and otp are required".to_owned()));
    }

    {
        let connection = lock_connection(&state.db_connection)?;

        if find_valid_otp(flat_no, &code, OffsetDateTime::now_utc(), &connection)?.is_none() {
            tracing::warn!("Rejected OTP for flat {flat_no}");
            return Err(Error::Validation("Invalid or expired OTP".to_owned()));
        }

        delete_otps_for_flat(flat_no, &connection)?;
    }

    let jar = set_session_cookie(
        jar,
        Role::Owner,
        Some(flat_no.to_owned()),
        state.cookie_duration,
    )?;
    tracing::info!("Owner of flat {flat_no} logged in");

    Ok((jar, Json(json!({ "success": true, "message": "OTP verified" }))))
}
