//! Deletes complaints once they are too old to be of interest.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, params};
use time::{Duration, OffsetDateTime};

use crate::{Error, db::lock_connection};

/// How long complaints are kept, regardless of their status.
pub const COMPLAINT_RETENTION: Duration = Duration::days(61);

/// Delete complaints created strictly before `now` minus [COMPLAINT_RETENTION].
///
/// Returns the number of complaints deleted.
pub fn delete_expired_complaints(
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<usize, Error> {
    let cutoff = now - COMPLAINT_RETENTION;

    let mut statement = connection.prepare("SELECT id, created_at FROM complaint")?;
    let expired_ids = statement
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, OffsetDateTime>(1)?))
        })?
        .filter_map(|row| match row {
            Ok((id, created_at)) if created_at < cutoff => Some(Ok(id)),
            Ok(_) => None,
            Err(error) => Some(Err(error)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut deleted = 0;
    for id in expired_ids {
        deleted += connection.execute("DELETE FROM complaint WHERE id = ?1", params![id])?;
    }

    Ok(deleted)
}

/// Delete expired complaints as of the current time and log how many were removed.
pub fn run_complaint_cleanup(db_connection: &Arc<Mutex<Connection>>) -> Result<usize, Error> {
    let connection = lock_connection(db_connection)?;
    let deleted = delete_expired_complaints(OffsetDateTime::now_utc(), &connection)?;

    tracing::info!("Complaint cleanup removed {deleted} complaint(s)");

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Duration, macros::datetime};

    use crate::{
        auth::Viewer,
        complaint::{NewComplaint, create_complaint, get_visible_complaints},
        db::initialize,
    };

    use super::delete_expired_complaints;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_complaint(body: &str, created_at: time::OffsetDateTime, conn: &Connection) {
        create_complaint(
            &NewComplaint {
                flat_no: "A-101".to_owned(),
                owner_name: "Rao".to_owned(),
                body: body.to_owned(),
                status: Some("closed".to_owned()),
                ..Default::default()
            },
            created_at,
            conn,
        )
        .unwrap();
    }

    #[test]
    fn removes_only_complaints_older_than_61_days() {
        let conn = get_test_connection();
        let now = datetime!(2025-09-10 08:30 UTC);
        insert_complaint("old", now - Duration::days(62), &conn);
        insert_complaint("recent", now - Duration::days(60), &conn);
        insert_complaint("boundary", now - Duration::days(61), &conn);

        let deleted = delete_expired_complaints(now, &conn).unwrap();

        let remaining: Vec<String> = get_visible_complaints(&Viewer::admin(), &conn)
            .unwrap()
            .into_iter()
            .map(|complaint| complaint.body)
            .collect();
        assert_eq!(deleted, 1);
        assert_eq!(remaining, ["boundary", "recent"]);
    }

    #[test]
    fn nothing_to_remove() {
        let conn = get_test_connection();

        assert_eq!(
            delete_expired_complaints(datetime!(2025-09-10 08:30 UTC), &conn),
            Ok(0)
        );
    }
}
