use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, database_id::DatabaseId, receipt::next_receipt_id};

/// The database ID of a receipt, not to be confused with [Receipt::receipt_id].
pub type ReceiptId = DatabaseId;

/// A maintenance payment received from an owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: ReceiptId,
    /// The human readable receipt number, e.g. "RCPT-20250901001".
    pub receipt_id: String,
    pub date: Date,
    pub flat_no: String,
    /// The owner's name at the time the receipt was issued.
    pub name: String,
    /// The month being paid for as a "Mon-YY" label, e.g. "Sep-25".
    pub month: String,
    /// Payment mode, e.g. "UPI", "Cash" or "Cheque".
    pub mode: String,
    pub txn_id: String,
    pub amount: f64,
    /// When the receipt was emailed to the owner, if it has been.
    #[serde(with = "time::serde::rfc3339::option")]
    pub notified_at: Option<OffsetDateTime>,
}

/// The body for creating a receipt.
///
/// A missing `receipt_id` is generated with [next_receipt_id] and a missing
/// `date` defaults to today.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReceipt {
    pub receipt_id: Option<String>,
    pub date: Option<Date>,
    #[serde(default)]
    pub flat_no: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub mode: String,
    pub txn_id: Option<String>,
    #[serde(default)]
    pub amount: f64,
}

pub fn create_receipt_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS receipt (
            id INTEGER PRIMARY KEY,
            receipt_id TEXT NOT NULL UNIQUE,
            date TEXT NOT NULL,
            flat_no TEXT NOT NULL,
            name TEXT NOT NULL,
            month TEXT NOT NULL,
            mode TEXT NOT NULL,
            txn_id TEXT NOT NULL,
            amount REAL NOT NULL,
            notified_at TEXT
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_receipt_flat_no ON receipt(flat_no);",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_receipt(row: &rusqlite::Row) -> Result<Receipt, rusqlite::Error> {
    Ok(Receipt {
        id: row.get(0)?,
        receipt_id: row.get(1)?,
        date: row.get(2)?,
        flat_no: row.get(3)?,
        name: row.get(4)?,
        month: row.get(5)?,
        mode: row.get(6)?,
        txn_id: row.get(7)?,
        amount: row.get(8)?,
        notified_at: row.get(9)?,
    })
}

/// Insert a new receipt.
///
/// # Errors
/// Returns [Error::Validation] if a required field is blank, the amount is
/// negative or not a finite number, or the receipt number is already taken.
pub fn create_receipt(
    form: &NewReceipt,
    today: Date,
    connection: &Connection,
) -> Result<Receipt, Error> {
    let flat_no = form.flat_no.trim();
    let name = form.name.trim();
    let month = form.month.trim();
    let mode = form.mode.trim();

    if flat_no.is_empty() || name.is_empty() || month.is_empty() || mode.is_empty() {
        return Err(Error::Validation(
            "flatNo, name, month and mode are required".to_owned(),
        ));
    }

    if !form.amount.is_finite() || form.amount < 0.0 {
        return Err(Error::Validation(
            "amount must be a non-negative number".to_owned(),
        ));
    }

    let receipt_id = match form.receipt_id.as_deref().map(str::trim) {
        Some(receipt_id) if !receipt_id.is_empty() => receipt_id.to_owned(),
        _ => next_receipt_id(today, connection)?,
    };
    let date = form.date.unwrap_or(today);
    let txn_id = form.txn_id.as_deref().unwrap_or_default().trim().to_owned();

    connection
        .execute(
            "INSERT INTO receipt (receipt_id, date, flat_no, name, month, mode, txn_id, amount)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![receipt_id, date, flat_no, name, month, mode, txn_id, form.amount],
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::Validation(format!("Receipt {receipt_id} already exists"))
            }
            error => error.into(),
        })?;

    Ok(Receipt {
        id: connection.last_insert_rowid(),
        receipt_id,
        date,
        flat_no: flat_no.to_owned(),
        name: name.to_owned(),
        month: month.to_owned(),
        mode: mode.to_owned(),
        txn_id,
        amount: form.amount,
        notified_at: None,
    })
}

pub fn get_all_receipts(connection: &Connection) -> Result<Vec<Receipt>, Error> {
    connection
        .prepare(
            "SELECT id, receipt_id, date, flat_no, name, month, mode, txn_id, amount, notified_at
            FROM receipt ORDER BY id DESC",
        )?
        .query_map([], map_row_to_receipt)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Record that the receipt `id` was emailed at `notified_at`.
pub fn mark_receipt_notified(
    id: ReceiptId,
    notified_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE receipt SET notified_at = ?1 WHERE id = ?2",
        params![notified_at, id],
    )?;

    Ok(())
}
