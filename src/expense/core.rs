use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, database_id::DatabaseId};

pub type ExpenseId = DatabaseId;

/// Money spent by the society, e.g. on electricity or repairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    pub id: ExpenseId,
    /// Free text, conventionally one of Maintenance, Electricity, Water,
    /// Security, Housekeeping, Repairs or Other.
    pub category: String,
    pub amount: f64,
    pub date: Date,
    pub note: Option<String>,
}

/// The body for creating an expense.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    #[serde(default)]
    pub category: String,
    pub amount: f64,
    pub date: Date,
    pub note: Option<String>,
}

pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            category TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            note TEXT
        )",
        (),
    )?;

    // Balance queries filter by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_expense(row: &rusqlite::Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        category: row.get(1)?,
        amount: row.get(2)?,
        date: row.get(3)?,
        note: row.get(4)?,
    })
}

/// Insert a new expense.
///
/// # Errors
/// Returns [Error::Validation] if the category is blank or the amount is
/// negative or not a finite number.
pub fn create_expense(form: &NewExpense, connection: &Connection) -> Result<Expense, Error> {
    let category = form.category.trim();

    if category.is_empty() {
        return Err(Error::Validation("category is required".to_owned()));
    }

    if !form.amount.is_finite() || form.amount < 0.0 {
        return Err(Error::Validation(
            "amount must be a non-negative number".to_owned(),
        ));
    }

    let note = form
        .note
        .as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_owned);

    connection.execute(
        "INSERT INTO expense (category, amount, date, note) VALUES (?1, ?2, ?3, ?4)",
        params![category, form.amount, form.date, note],
    )?;

    Ok(Expense {
        id: connection.last_insert_rowid(),
        category: category.to_owned(),
        amount: form.amount,
        date: form.date,
        note,
    })
}

pub fn get_all_expenses(connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare("SELECT id, category, amount, date, note FROM expense ORDER BY id DESC")?
        .query_map([], map_row_to_expense)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}
