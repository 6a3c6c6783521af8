use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Where a complaint is in its lifecycle.
///
/// Complaints start out open. The admin may move a complaint to any status
/// at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    #[default]
    Open,
    Ongoing,
    Closed,
    NotPossible,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Open => "open",
            ComplaintStatus::Ongoing => "ongoing",
            ComplaintStatus::Closed => "closed",
            ComplaintStatus::NotPossible => "not_possible",
        }
    }
}

impl Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(ComplaintStatus::Open),
            "ongoing" => Ok(ComplaintStatus::Ongoing),
            "closed" => Ok(ComplaintStatus::Closed),
            "not_possible" => Ok(ComplaintStatus::NotPossible),
            _ => Err(Error::Validation(format!("Invalid status: {s}"))),
        }
    }
}

impl ToSql for ComplaintStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ComplaintStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}
