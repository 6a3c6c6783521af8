//! Route handlers for `/api/{table}` and `/api/{table}/{id}`.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    announcement::{NewAnnouncement, create_announcement, get_all_announcements},
    auth::Viewer,
    complaint::{
        ComplaintPatch, NewComplaint, create_complaint, get_visible_complaints, update_complaint,
    },
    database_id::DatabaseId,
    db::lock_connection,
    expense::{NewExpense, create_expense, get_all_expenses},
    gateway::Table,
    json_body::parse_json_body,
    owner::{NewOwner, create_owner, get_all_owners},
    receipt::{NewReceipt, create_receipt, get_all_receipts, next_receipt_id},
    timezone::local_today,
};

/// The state needed by the table endpoints.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// The shared database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used to work out "today" for rows that default their date.
    pub local_timezone: String,
}

impl FromRef<AppState> for GatewayState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler that lists every row of a table, newest first.
///
/// Complaints are filtered down to the ones the caller may see. Every other
/// table needs an owner or admin session.
pub async fn list_endpoint(
    State(state): State<GatewayState>,
    viewer: Viewer,
    Path(table): Path<String>,
) -> Result<Response, Error> {
    let table: Table = table.parse()?;

    if table != Table::Complaints {
        viewer.require_signed_in()?;
    }

    let connection = lock_connection(&state.db_connection)?;

    let response = match table {
        Table::Owners => Json(get_all_owners(&connection)?).into_response(),
        Table::Expenses => Json(get_all_expenses(&connection)?).into_response(),
        Table::Receipts => Json(get_all_receipts(&connection)?).into_response(),
        Table::Announcements => Json(get_all_announcements(&connection)?).into_response(),
        Table::Complaints => Json(get_visible_complaints(&viewer, &connection)?).into_response(),
    };

    Ok(response)
}

/// A route handler that inserts a row and responds with it and `201 Created`.
///
/// A complaint raised by a signed in owner is always filed under their own
/// flat.
pub async fn create_endpoint(
    State(state): State<GatewayState>,
    viewer: Viewer,
    Path(table): Path<String>,
    body: Bytes,
) -> Result<Response, Error> {
    let table: Table = table.parse()?;

    if table.admin_only_create() {
        viewer.require_admin()?;
    }

    let today = local_today(&state.local_timezone)?;

    match table {
        Table::Owners => {
            let form: NewOwner = parse_json_body(&body)?;
            let connection = lock_connection(&state.db_connection)?;
            created(table, create_owner(&form, &connection)?, |owner| owner.id)
        }
        Table::Expenses => {
            let form: NewExpense = parse_json_body(&body)?;
            let connection = lock_connection(&state.db_connection)?;
            created(table, create_expense(&form, &connection)?, |expense| {
                expense.id
            })
        }
        Table::Receipts => {
            let form: NewReceipt = parse_json_body(&body)?;
            let connection = lock_connection(&state.db_connection)?;
            created(table, create_receipt(&form, today, &connection)?, |receipt| {
                receipt.id
            })
        }
        Table::Announcements => {
            let form: NewAnnouncement = parse_json_body(&body)?;
            let connection = lock_connection(&state.db_connection)?;
            created(
                table,
                create_announcement(&form, today, &connection)?,
                |announcement| announcement.id,
            )
        }
        Table::Complaints => {
            let mut form: NewComplaint = parse_json_body(&body)?;
            if let Some(flat_no) = viewer.owner_flat() {
                form.flat_no = flat_no.to_owned();
            }
            let connection = lock_connection(&state.db_connection)?;
            created(
                table,
                create_complaint(&form, OffsetDateTime::now_utc(), &connection)?,
                |complaint| complaint.id,
            )
        }
    }
}

fn created<T: Serialize>(
    table: Table,
    row: T,
    get_id: impl Fn(&T) -> DatabaseId,
) -> Result<Response, Error> {
    tracing::info!("Created {table} row {}", get_id(&row));

    Ok((StatusCode::CREATED, Json(row)).into_response())
}

/// A route handler for reading a single derived value of a table.
///
/// The only such value is `/api/receipts/next_id`, the receipt number that
/// the next receipt would be given.
pub async fn get_row_endpoint(
    State(state): State<GatewayState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<Response, Error> {
    let table: Table = table.parse()?;

    match (table, id.as_str()) {
        (Table::Receipts, "next_id") => {
            let today = local_today(&state.local_timezone)?;
            let connection = lock_connection(&state.db_connection)?;
            let receipt_id = next_receipt_id(today, &connection)?;

            Ok(Json(json!({ "receiptId": receipt_id })).into_response())
        }
        _ => Err(Error::NotFound("Not found".to_owned())),
    }
}

/// A route handler for patching a complaint's status and admin comments.
/// Admin only.
pub async fn update_endpoint(
    State(state): State<GatewayState>,
    viewer: Viewer,
    Path((table, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, Error> {
    let table: Table = table.parse()?;

    if table != Table::Complaints {
        return Err(Error::Validation(format!("{table} cannot be updated")));
    }

    viewer.require_admin()?;
    let id = parse_id(&id)?;
    let patch: ComplaintPatch = parse_json_body(&body)?;

    let connection = lock_connection(&state.db_connection)?;
    let complaint = update_complaint(id, &patch, &connection)?;
    tracing::info!("Updated complaint {id} to {}", complaint.status);

    Ok(Json(complaint).into_response())
}

/// A route handler that deletes a row by id. Admin only.
///
/// Responds with success even if no row had that id.
pub async fn delete_endpoint(
    State(state): State<GatewayState>,
    viewer: Viewer,
    Path((table, id)): Path<(String, String)>,
) -> Result<Response, Error> {
    let table: Table = table.parse()?;
    viewer.require_admin()?;
    let id = parse_id(&id)?;

    let connection = lock_connection(&state.db_connection)?;
    let rows_affected = connection.execute(table.delete_sql(), [id])?;

    if rows_affected == 0 {
        tracing::debug!("Delete of {table} row {id} matched nothing");
    } else {
        tracing::info!("Deleted {table} row {id}");
    }

    Ok(Json(json!({ "success": true })).into_response())
}

fn parse_id(id: &str) -> Result<DatabaseId, Error> {
    id.parse()
        .map_err(|_| Error::Validation(format!("Invalid id: {id}")))
}
