use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, auth::Viewer, complaint::ComplaintStatus, database_id::DatabaseId};

pub type ComplaintId = DatabaseId;

/// A complaint raised by the owner of a flat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Complaint {
    pub id: ComplaintId,
    #[serde(rename = "flatNo")]
    pub flat_no: String,
    #[serde(rename = "ownerName")]
    pub owner_name: String,
    pub body: String,
    /// Private complaints are only shown to the admin and the flat's owner.
    pub is_public: bool,
    pub status: ComplaintStatus,
    pub admin_comments: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Complaint {
    /// Whether `viewer` may see this complaint.
    pub fn is_visible_to(&self, viewer: &Viewer) -> bool {
        self.is_public || viewer.is_admin() || viewer.owns_flat(&self.flat_no)
    }
}

/// The body for creating a complaint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComplaint {
    #[serde(default, rename = "flatNo")]
    pub flat_no: String,
    #[serde(default, rename = "ownerName")]
    pub owner_name: String,
    #[serde(default)]
    pub body: String,
    pub is_public: Option<bool>,
    pub status: Option<String>,
    pub admin_comments: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

pub fn create_complaint_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS complaint (
            id INTEGER PRIMARY KEY,
            flat_no TEXT NOT NULL,
            owner_name TEXT NOT NULL,
            body TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'open',
            admin_comments TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub(super) fn map_row_to_complaint(row: &rusqlite::Row) -> Result<Complaint, rusqlite::Error> {
    Ok(Complaint {
        id: row.get(0)?,
        flat_no: row.get(1)?,
        owner_name: row.get(2)?,
        body: row.get(3)?,
        is_public: row.get(4)?,
        status: row.get(5)?,
        admin_comments: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub(super) const SELECT_COMPLAINT: &str = "SELECT id, flat_no, owner_name, body, is_public, \
    status, admin_comments, created_at FROM complaint";

/// Insert a new complaint. Unless given, the complaint is public, open and
/// created at `now`.
///
/// # Errors
/// Returns [Error::Validation] if the flat number, owner name or body is
/// blank, or the status is not a known status.
pub fn create_complaint(
    form: &NewComplaint,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Complaint, Error> {
    let flat_no = form.flat_no.trim();
    let owner_name = form.owner_name.trim();
    let body = form.body.trim();

    if flat_no.is_empty() || owner_name.is_empty() || body.is_empty() {
        return Err(Error::Validation(
            "flatNo, ownerName and body are required".to_owned(),
        ));
    }

    let status = match form.status.as_deref() {
        Some(status) if !status.trim().is_empty() => status.parse()?,
        _ => ComplaintStatus::Open,
    };
    let is_public = form.is_public.unwrap_or(true);
    let admin_comments = form.admin_comments.clone().unwrap_or_default();
    let created_at = form.created_at.unwrap_or(now).to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO complaint (flat_no, owner_name, body, is_public, status, admin_comments, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            flat_no,
            owner_name,
            body,
            is_public,
            status,
            admin_comments,
            created_at
        ],
    )?;

    Ok(Complaint {
        id: connection.last_insert_rowid(),
        flat_no: flat_no.to_owned(),
        owner_name: owner_name.to_owned(),
        body: body.to_owned(),
        is_public,
        status,
        admin_comments,
        created_at,
    })
}

/// Get the complaints `viewer` may see, newest first.
pub fn get_visible_complaints(
    viewer: &Viewer,
    connection: &Connection,
) -> Result<Vec<Complaint>, Error> {
    let complaints = connection
        .prepare(&format!("{SELECT_COMPLAINT} ORDER BY id DESC"))?
        .query_map([], map_row_to_complaint)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(complaints
        .into_iter()
        .filter(|complaint| complaint.is_visible_to(viewer))
        .collect())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        auth::Viewer,
        complaint::{ComplaintStatus, NewComplaint},
        db::initialize,
    };

    use super::{create_complaint, get_visible_complaints};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn complaint(flat_no: &str, is_public: bool) -> NewComplaint {
        NewComplaint {
            flat_no: flat_no.to_owned(),
            owner_name: "Rao".to_owned(),
            body: "Leaking pipe in the stairwell".to_owned(),
            is_public: Some(is_public),
            ..Default::default()
        }
    }

    fn visible_flats(viewer: &Viewer, conn: &Connection) -> Vec<String> {
        get_visible_complaints(viewer, conn)
            .unwrap()
            .into_iter()
            .map(|complaint| complaint.flat_no)
            .collect()
    }

    #[test]
    fn create_applies_defaults() {
        let conn = get_test_connection();
        let now = datetime!(2025-09-10 08:30 UTC);

        let got = create_complaint(
            &NewComplaint {
                is_public: None,
                ..complaint("A-101", true)
            },
            now,
            &conn,
        )
        .unwrap();

        assert!(got.is_public);
        assert_eq!(got.status, ComplaintStatus::Open);
        assert_eq!(got.admin_comments, "");
        assert_eq!(got.created_at, now);
    }

    #[test]
    fn create_keeps_explicit_created_at_in_utc() {
        let conn = get_test_connection();

        let got = create_complaint(
            &NewComplaint {
                created_at: Some(datetime!(2025-07-01 05:30 +05:30)),
                ..complaint("A-101", true)
            },
            datetime!(2025-09-10 08:30 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(got.created_at, datetime!(2025-07-01 00:00 UTC));
    }

    #[test]
    fn create_requires_body() {
        let conn = get_test_connection();

        let result = create_complaint(
            &NewComplaint {
                body: "   ".to_owned(),
                ..complaint("A-101", true)
            },
            datetime!(2025-09-10 08:30 UTC),
            &conn,
        );

        assert_eq!(
            result,
            Err(Error::Validation(
                "flatNo, ownerName and body are required".to_owned()
            ))
        );
    }

    #[test]
    fn private_complaints_are_hidden_from_other_callers() {
        let conn = get_test_connection();
        let now = datetime!(2025-09-10 08:30 UTC);
        create_complaint(&complaint("A-101", false), now, &conn).unwrap();
        create_complaint(&complaint("B-202", true), now, &conn).unwrap();

        assert_eq!(visible_flats(&Viewer::guest(), &conn), ["B-202"]);
        assert_eq!(visible_flats(&Viewer::owner("C-303"), &conn), ["B-202"]);
        assert_eq!(
            visible_flats(&Viewer::owner("a-101"), &conn),
            ["B-202", "A-101"]
        );
        assert_eq!(visible_flats(&Viewer::admin(), &conn), ["B-202", "A-101"]);
    }
}
