use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId};

/// The ID of an owner row.
pub type OwnerId = DatabaseId;

/// The owner of a flat in the society.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// The id for the owner.
    pub id: OwnerId,
    /// The flat number, e.g. "A-101". Unique across owners.
    pub flat_no: String,
    /// The owner's name.
    pub name: String,
    /// A phone number or other contact detail.
    pub contact: String,
    /// The area of the flat in square feet.
    pub sqft: i64,
    /// Parking slot information.
    pub parking: Option<String>,
    /// Where OTPs and monthly receipts are sent.
    pub email: Option<String>,
}

/// The body for creating an owner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOwner {
    #[serde(default)]
    pub flat_no: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub sqft: i64,
    pub parking: Option<String>,
    pub email: Option<String>,
}

pub fn create_owner_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS owner (
            id INTEGER PRIMARY KEY,
            flat_no TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            contact TEXT NOT NULL,
            sqft INTEGER NOT NULL,
            parking TEXT,
            email TEXT
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_owner(row: &rusqlite::Row) -> Result<Owner, rusqlite::Error> {
    Ok(Owner {
        id: row.get(0)?,
        flat_no: row.get(1)?,
        name: row.get(2)?,
        contact: row.get(3)?,
        sqft: row.get(4)?,
        parking: row.get(5)?,
        email: row.get(6)?,
    })
}

/// Insert a new owner.
///
/// Blank optional fields are stored as NULL so that an owner created with an
/// empty email is treated as having no email.
///
/// # Errors
/// Returns [Error::Validation] if a required field is blank, the area is
/// negative, or another owner already has the same flat number.
pub fn create_owner(form: &NewOwner, connection: &Connection) -> Result<Owner, Error> {
    let flat_no = form.flat_no.trim();
    let name = form.name.trim();
    let contact = form.contact.trim();

    if flat_no.is_empty() || name.is_empty() || contact.is_empty() {
        return Err(Error::Validation(
            "flatNo, name and contact are required".to_owned(),
        ));
    }

    if form.sqft < 0 {
        return Err(Error::Validation("sqft cannot be negative".to_owned()));
    }

    let parking = non_blank(form.parking.as_deref());
    let email = non_blank(form.email.as_deref());

    connection
        .execute(
            "INSERT INTO owner (flat_no, name, contact, sqft, parking, email)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![flat_no, name, contact, form.sqft, parking, email],
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::Validation(format!("An owner for flat {flat_no} already exists"))
            }
            error => error.into(),
        })?;

    Ok(Owner {
        id: connection.last_insert_rowid(),
        flat_no: flat_no.to_owned(),
        name: name.to_owned(),
        contact: contact.to_owned(),
        sqft: form.sqft,
        parking,
        email,
    })
}

/// Get every owner, newest first.
pub fn get_all_owners(connection: &Connection) -> Result<Vec<Owner>, Error> {
    connection
        .prepare(
            "SELECT id, flat_no, name, contact, sqft, parking, email FROM owner ORDER BY id DESC",
        )?
        .query_map([], map_row_to_owner)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Get the email address of the owner of `flat_no`.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if no owner has the flat number.
/// - [Error::Validation] if the owner has no email on file.
pub fn get_owner_email(flat_no: &str, connection: &Connection) -> Result<String, Error> {
    let email: Option<String> = connection
        .query_row(
            "SELECT email FROM owner WHERE flat_no = ?1",
            params![flat_no],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| Error::NotFound("Owner not found".to_owned()))?;

    email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| Error::Validation("Owner email not found".to_owned()))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}
