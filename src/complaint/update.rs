use rusqlite::{Connection, OptionalExtension, params};
use serde::Deserialize;

use crate::{
    Error,
    complaint::{
        Complaint, ComplaintId, ComplaintStatus,
        core::{SELECT_COMPLAINT, map_row_to_complaint},
    },
};

/// The fields of a complaint the admin may change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplaintPatch {
    pub status: Option<String>,
    pub admin_comments: Option<String>,
}

/// Apply `patch` to the complaint `id` and return the updated complaint.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if the patch is empty or names an unknown status.
/// - [Error::NotFound] if there is no complaint with the given id.
pub fn update_complaint(
    id: ComplaintId,
    patch: &ComplaintPatch,
    connection: &Connection,
) -> Result<Complaint, Error> {
    if patch.status.is_none() && patch.admin_comments.is_none() {
        return Err(Error::Validation("No fields to update".to_owned()));
    }

    let status: Option<ComplaintStatus> = patch
        .status
        .as_deref()
        .map(str::parse)
        .transpose()?;

    let rows_affected = connection.execute(
        "UPDATE complaint SET
            status = COALESCE(?1, status),
            admin_comments = COALESCE(?2, admin_comments)
        WHERE id = ?3",
        params![status, patch.admin_comments, id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound("Complaint not found".to_owned()));
    }

    connection
        .query_row(
            &format!("{SELECT_COMPLAINT} WHERE id = ?1"),
            params![id],
            map_row_to_complaint,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound("Complaint not found".to_owned()))
}
