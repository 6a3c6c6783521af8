use std::{fmt::Display, str::FromStr};

use crate::Error;

/// The tables that can be reached through `/api/{table}`.
///
/// Path segments are parsed into this enum before anything else happens, and
/// each variant maps to fixed SQL, so client input never ends up in an
/// identifier position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Owners,
    Expenses,
    Receipts,
    Announcements,
    Complaints,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Owners => "owners",
            Table::Expenses => "expenses",
            Table::Receipts => "receipts",
            Table::Announcements => "announcements",
            Table::Complaints => "complaints",
        }
    }

    pub fn delete_sql(&self) -> &'static str {
        match self {
            Table::Owners => "DELETE FROM owner WHERE id = ?1",
            Table::Expenses => "DELETE FROM expense WHERE id = ?1",
            Table::Receipts => "DELETE FROM receipt WHERE id = ?1",
            Table::Announcements => "DELETE FROM announcement WHERE id = ?1",
            Table::Complaints => "DELETE FROM complaint WHERE id = ?1",
        }
    }

    /// Whether creating rows needs an admin session.
    ///
    /// Anyone may raise a complaint; everything else is managed by the admin.
    pub fn admin_only_create(&self) -> bool {
        !matches!(self, Table::Complaints)
    }
}

impl FromStr for Table {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owners" => Ok(Table::Owners),
            "expenses" => Ok(Table::Expenses),
            "receipts" => Ok(Table::Receipts),
            "announcements" => Ok(Table::Announcements),
            "complaints" => Ok(Table::Complaints),
            other => Err(Error::InvalidTable(other.to_owned())),
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::Table;

    #[test]
    fn parses_every_table() {
        for table in [
            Table::Owners,
            Table::Expenses,
            Table::Receipts,
            Table::Announcements,
            Table::Complaints,
        ] {
            assert_eq!(table.as_str().parse::<Table>(), Ok(table));
        }
    }

    #[test]
    fn rejects_unknown_tables() {
        for name in ["users", "otp", "setting", "Owners", "owners; DROP TABLE owner", ""] {
            assert_eq!(
                name.parse::<Table>(),
                Err(Error::InvalidTable(name.to_owned()))
            );
        }
    }

    #[test]
    fn only_complaints_are_open_to_everyone() {
        assert!(!Table::Complaints.admin_only_create());
        assert!(Table::Owners.admin_only_create());
        assert!(Table::Receipts.admin_only_create());
    }
}
