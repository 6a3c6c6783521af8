#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, PasswordHash, ValidatedPassword,
    auth::{COOKIE_SESSION, set_admin_password},
    build_router,
    db::initialize,
    endpoints,
    mail::{Email, MailError, Mailer},
    owner::{NewOwner, create_owner},
};

/// The admin password stored by [get_test_state_with_mailer].
pub(crate) const TEST_ADMIN_PASSWORD: &str = "test";

/// An in-memory database with every table created.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");

    connection
}

/// A [Mailer] that keeps every email instead of sending it.
#[derive(Debug, Default)]
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    pub(crate) fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A [Mailer] whose server is always unreachable.
#[derive(Debug, Default)]
pub(crate) struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &Email) -> Result<(), MailError> {
        Err(MailError::Send("connection refused".to_owned()))
    }
}

/// App state over an in-memory database with the admin password set to
/// [TEST_ADMIN_PASSWORD].
pub(crate) fn get_test_state_with_mailer(mailer: Arc<dyn Mailer>) -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    let state = AppState::new(connection, "foobar", "Asia/Kolkata", mailer)
        .expect("Could not create app state.");

    let password_hash =
        PasswordHash::new(ValidatedPassword::new_unchecked(TEST_ADMIN_PASSWORD), 4)
            .expect("Could not hash password.");
    set_admin_password(&password_hash, &state.db_connection.lock().unwrap())
        .expect("Could not set admin password.");

    state
}

pub(crate) fn get_test_state() -> AppState {
    get_test_state_with_mailer(Arc::new(RecordingMailer::default()))
}

pub(crate) fn get_test_server_with_state(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

pub(crate) fn get_test_server() -> TestServer {
    get_test_server_with_state(get_test_state())
}

pub(crate) fn insert_test_owner(state: &AppState, flat_no: &str, email: Option<&str>) {
    let connection = state.db_connection.lock().unwrap();

    create_owner(
        &NewOwner {
            flat_no: flat_no.to_owned(),
            name: "R. Rao".to_owned(),
            contact: "9876543210".to_owned(),
            sqft: 1200,
            parking: None,
            email: email.map(str::to_owned),
        },
        &connection,
    )
    .expect("Could not create owner.");
}

/// Log in as the admin and return the session cookie.
pub(crate) async fn admin_cookie(server: &TestServer) -> Cookie<'static> {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({ "password": TEST_ADMIN_PASSWORD }))
        .await;
    response.assert_status_ok();

    response.cookie(COOKIE_SESSION)
}

/// Log in as the owner of `flat_no` with the OTP emailed through `mailer`.
///
/// The owner must already exist with an email address.
pub(crate) async fn owner_cookie(
    server: &TestServer,
    mailer: &RecordingMailer,
    flat_no: &str,
) -> Cookie<'static> {
    server
        .post(endpoints::SEND_OTP)
        .json(&json!({ "flatNo": flat_no }))
        .await
        .assert_status_ok();

    let code: String = mailer
        .sent()
        .last()
        .expect("No OTP email was sent.")
        .body
        .chars()
        .filter(char::is_ascii_digit)
        .take(5)
        .collect();

    let response = server
        .post(endpoints::VERIFY_OTP)
        .json(&json!({ "flatNo": flat_no, "otp": code }))
        .await;
    response.assert_status_ok();

    response.cookie(COOKIE_SESSION)
}
