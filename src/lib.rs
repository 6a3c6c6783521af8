//! Society management backend.
//!
//! A JSON REST API for a small residential society: owners, expenses,
//! maintenance receipts, announcements, complaints and settings, with OTP
//! log-in for owners, a balance summary, and a scheduled job that emails each
//! owner their monthly maintenance receipt as a PDF.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod announcement;
mod app_state;
mod auth;
mod balance;
mod complaint;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod gateway;
mod json_body;
mod logging;
mod mail;
mod notifier;
mod otp;
mod owner;
mod receipt;
mod routing;
mod setting;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword, set_admin_password};
pub use complaint::run_complaint_cleanup;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use mail::{Attachment, Email, MailConfig, MailError, Mailer, SmtpMailer};
pub use notifier::{
    IntervalSchedule, MonthlyReceiptNotifier, MonthlySchedule, NotifierConfig, NotifierReport,
    Schedule, Society, run_on_schedule, send_monthly_receipts,
};
pub use routing::build_router;
pub use timezone::get_local_offset;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or a value could not be parsed.
    ///
    /// The message is shown to the client as is.
    #[error("{0}")]
    Validation(String),

    /// The table name in the request path is not one of the managed tables.
    #[error("Invalid table")]
    InvalidTable(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("{0}")]
    NotFound(String),

    /// The admin password did not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The caller does not hold an admin session.
    #[error("Admin access required")]
    Forbidden,

    /// The caller has neither an owner nor an admin session.
    #[error("Log in to view this table")]
    SignInRequired,

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The admin password is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An email could not be built or delivered.
    #[error("could not send email: {0}")]
    MailError(String),

    /// A receipt document could not be rendered.
    #[error("could not render receipt: {0}")]
    RenderError(String),

    /// Reading or writing a temporary file failed.
    #[error("file I/O failed: {0}")]
    IoError(String),

    /// The configured timezone is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// A session token could not be encoded or decoded.
    #[error("invalid session token: {0}")]
    TokenError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound("the requested resource could not be found".to_owned())
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::IoError(value.to_string())
    }
}

impl From<MailError> for Error {
    fn from(value: MailError) -> Self {
        Error::MailError(value.to_string())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidTable(_) | Error::TooWeak(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden | Error::SignInRequired => StatusCode::FORBIDDEN,
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::MailError(_)
            | Error::RenderError(_)
            | Error::IoError(_)
            | Error::InvalidTimezoneError(_)
            | Error::TokenError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
