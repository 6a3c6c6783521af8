use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, database_id::DatabaseId};

pub type AnnouncementId = DatabaseId;

/// A notice posted by the committee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub body: Option<String>,
    pub date: Date,
}

/// The body for creating an announcement. `date` defaults to today.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnouncement {
    #[serde(default)]
    pub title: String,
    pub body: Option<String>,
    pub date: Option<Date>,
}

pub fn create_announcement_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS announcement (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            body TEXT,
            date TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_announcement(row: &rusqlite::Row) -> Result<Announcement, rusqlite::Error> {
    Ok(Announcement {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        date: row.get(3)?,
    })
}

/// Insert a new announcement dated `form.date`, or `today` if no date is given.
///
/// # Errors
/// Returns [Error::Validation] if the title is blank.
pub fn create_announcement(
    form: &NewAnnouncement,
    today: Date,
    connection: &Connection,
) -> Result<Announcement, Error> {
    let title = form.title.trim();

    if title.is_empty() {
        return Err(Error::Validation("title is required".to_owned()));
    }

    let date = form.date.unwrap_or(today);

    connection.execute(
        "INSERT INTO announcement (title, body, date) VALUES (?1, ?2, ?3)",
        params![title, form.body, date],
    )?;

    Ok(Announcement {
        id: connection.last_insert_rowid(),
        title: title.to_owned(),
        body: form.body.clone(),
        date,
    })
}

pub fn get_all_announcements(connection: &Connection) -> Result<Vec<Announcement>, Error> {
    connection
        .prepare("SELECT id, title, body, date FROM announcement ORDER BY id DESC")?
        .query_map([], map_row_to_announcement)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}
