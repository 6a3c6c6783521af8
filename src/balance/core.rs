use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Month};

use crate::{
    Error,
    setting::{INITIAL_BALANCE, get_setting},
};

/// The amount and date of a receipt or expense.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerEntry {
    pub amount: f64,
    pub date: Date,
}

/// Restricts ledger entries to a calendar month and/or year. `None` matches
/// any month or year.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodFilter {
    pub month: Option<Month>,
    pub year: Option<i32>,
}

impl PeriodFilter {
    /// Parse the filter from query parameters. Missing or blank parameters
    /// match everything.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the month is not a number from 1 to 12
    /// or the year is not a number.
    pub fn parse(month: Option<&str>, year: Option<&str>) -> Result<Self, Error> {
        let month = match month.map(str::trim).filter(|month| !month.is_empty()) {
            Some(month) => {
                let number: u8 = month
                    .parse()
                    .map_err(|_| Error::Validation(format!("Invalid month: {month}")))?;
                Some(
                    Month::try_from(number)
                        .map_err(|_| Error::Validation(format!("Invalid month: {month}")))?,
                )
            }
            None => None,
        };

        let year = match year.map(str::trim).filter(|year| !year.is_empty()) {
            Some(year) => Some(
                year.parse()
                    .map_err(|_| Error::Validation(format!("Invalid year: {year}")))?,
            ),
            None => None,
        };

        Ok(Self { month, year })
    }

    pub fn matches(&self, date: Date) -> bool {
        self.month.is_none_or(|month| date.month() == month)
            && self.year.is_none_or(|year| date.year() == year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub initial_balance: f64,
    pub total_collection: f64,
    pub total_expenses: f64,
    /// `initial_balance + total_collection - total_expenses`.
    pub balance: f64,
}

/// Sum the receipts and expenses that match `filter` on top of `initial_balance`.
pub fn summarize(
    initial_balance: f64,
    receipts: &[LedgerEntry],
    expenses: &[LedgerEntry],
    filter: &PeriodFilter,
) -> BalanceSummary {
    let total = |entries: &[LedgerEntry]| -> f64 {
        entries
            .iter()
            .filter(|entry| filter.matches(entry.date))
            .map(|entry| entry.amount)
            .sum()
    };

    let total_collection = total(receipts);
    let total_expenses = total(expenses);

    BalanceSummary {
        initial_balance,
        total_collection,
        total_expenses,
        balance: initial_balance + total_collection - total_expenses,
    }
}

/// Compute the balance summary from the database.
///
/// A missing `initial_balance` setting counts as zero, as does one that is not
/// a number.
pub fn get_balance_summary(
    filter: &PeriodFilter,
    connection: &Connection,
) -> Result<BalanceSummary, Error> {
    let receipts = get_ledger_entries("SELECT amount, date FROM receipt", connection)?;
    let expenses = get_ledger_entries("SELECT amount, date FROM expense", connection)?;
    let initial_balance = get_initial_balance(connection)?;

    Ok(summarize(initial_balance, &receipts, &expenses, filter))
}

fn get_ledger_entries(query: &str, connection: &Connection) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(query)?
        .query_map([], |row| {
            Ok(LedgerEntry {
                amount: row.get(0)?,
                date: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn get_initial_balance(connection: &Connection) -> Result<f64, Error> {
    let value = match get_setting(INITIAL_BALANCE, connection) {
        Ok(setting) => setting.value,
        Err(Error::NotFound(_)) => return Ok(0.0),
        Err(error) => return Err(error),
    };

    match value.trim().parse::<f64>() {
        Ok(balance) if balance.is_finite() => Ok(balance),
        _ => {
            tracing::warn!("Ignoring {INITIAL_BALANCE} setting {value:?} as it is not a number");
            Ok(0.0)
        }
    }
}
