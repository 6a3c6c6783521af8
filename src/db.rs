//! Creates the application's tables and hands out the shared connection.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, announcement::create_announcement_table, auth::create_admin_credential_table,
    complaint::create_complaint_table, expense::create_expense_table, otp::create_otp_table,
    owner::create_owner_table, receipt::create_receipt_table, setting::create_setting_table,
};

/// Create all of the application's tables if they do not exist yet.
///
/// The tables are created inside a single exclusive transaction, so either
/// every table exists afterwards or none of the statements took effect.
///
/// # Errors
/// Returns an error if any of the `CREATE TABLE` statements fail.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_owner_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_receipt_table(&transaction)?;
    create_announcement_table(&transaction)?;
    create_complaint_table(&transaction)?;
    create_otp_table(&transaction)?;
    create_setting_table(&transaction)?;
    create_admin_credential_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Lock the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
