//! The monthly batch that emails receipts to owners.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    db::lock_connection,
    mail::{Attachment, Email, Mailer},
    notifier::{Society, render_receipt_pdf},
    receipt::{Receipt, map_row_to_receipt, mark_receipt_notified, month_key, parse_month_label},
    timezone::local_now,
};

/// A receipt together with the email address of the flat's owner.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptNotice {
    pub receipt: Receipt,
    pub email: String,
}

/// Settings for [send_monthly_receipts].
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Where receipts are rendered before being attached.
    pub temp_dir: PathBuf,
    /// The letterhead printed on each receipt.
    pub society: Society,
}

/// The outcome of one run of the notifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierReport {
    /// Receipts emailed and marked as notified.
    pub sent: usize,
    /// Receipts left pending because rendering or sending failed.
    pub failed: usize,
}

/// Get the receipts for `month` of `year` that have not been emailed yet and
/// whose owner has an email address.
pub fn get_pending_receipt_notices(
    year: i32,
    month: Month,
    connection: &Connection,
) -> Result<Vec<ReceiptNotice>, Error> {
    let notices = connection
        .prepare(
            "SELECT r.id, r.receipt_id, r.date, r.flat_no, r.name, r.month, r.mode, r.txn_id,
                r.amount, r.notified_at, o.email
            FROM receipt r
            INNER JOIN owner o ON r.flat_no = o.flat_no
            WHERE r.notified_at IS NULL
                AND o.email IS NOT NULL
                AND TRIM(o.email) != ''
            ORDER BY r.id ASC",
        )?
        .query_map([], |row| {
            Ok(ReceiptNotice {
                receipt: map_row_to_receipt(row)?,
                email: row.get(10)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(notices
        .into_iter()
        .filter(|notice| parse_month_label(&notice.receipt.month) == Some((year, month)))
        .collect())
}

/// Email every pending receipt for the month of `now` to its owner.
///
/// Each receipt is rendered to a file in the temp directory, attached to an
/// email, and the file is deleted whether or not the email was sent. Failures
/// for one receipt are logged and do not stop the rest of the batch.
/// Receipts that were sent are marked as notified so a second run in the same
/// month does not send them again.
///
/// # Errors
/// Returns an error if the pending receipts cannot be read or the temp
/// directory cannot be created.
pub async fn send_monthly_receipts(
    db_connection: &Arc<Mutex<Connection>>,
    mailer: &dyn Mailer,
    config: &NotifierConfig,
    now: OffsetDateTime,
) -> Result<NotifierReport, Error> {
    let today = now.date();
    let notices = {
        let connection = lock_connection(db_connection)?;
        get_pending_receipt_notices(today.year(), today.month(), &connection)?
    };

    tracing::info!(
        "Sending {} receipt(s) for {}",
        notices.len(),
        month_key(today)
    );

    if notices.is_empty() {
        return Ok(NotifierReport::default());
    }

    tokio::fs::create_dir_all(&config.temp_dir).await?;

    let mut report = NotifierReport::default();

    for notice in notices {
        let receipt = &notice.receipt;

        match send_receipt_notice(&notice, mailer, config, today).await {
            Ok(()) => {
                report.sent += 1;

                if let Err(error) = mark_notified(db_connection, receipt) {
                    tracing::error!(
                        "Sent receipt {} but could not mark it as notified: {error}",
                        receipt.receipt_id
                    );
                }
            }
            Err(error) => {
                report.failed += 1;
                tracing::error!(
                    "Could not send receipt {} to {}: {error}",
                    receipt.receipt_id,
                    notice.email
                );
            }
        }
    }

    tracing::info!(
        "Monthly receipts done: {} sent, {} failed",
        report.sent,
        report.failed
    );

    Ok(report)
}

async fn send_receipt_notice(
    notice: &ReceiptNotice,
    mailer: &dyn Mailer,
    config: &NotifierConfig,
    today: Date,
) -> Result<(), Error> {
    let receipt = &notice.receipt;
    let filename = format!(
        "receipt_{}_{}.pdf",
        sanitise_filename(&receipt.flat_no),
        month_key(today)
    );
    let path = config.temp_dir.join(&filename);

    let pdf = render_receipt_pdf(receipt, &config.society)?;
    let result = write_and_send(&path, pdf, &filename, notice, mailer).await;

    if let Err(error) = tokio::fs::remove_file(&path).await {
        tracing::warn!("Could not remove {}: {error}", path.display());
    }

    result
}

async fn write_and_send(
    path: &Path,
    pdf: Vec<u8>,
    filename: &str,
    notice: &ReceiptNotice,
    mailer: &dyn Mailer,
) -> Result<(), Error> {
    tokio::fs::write(path, pdf).await?;
    let data = tokio::fs::read(path).await?;

    let receipt = &notice.receipt;
    let email = Email::new(
        notice.email.clone(),
        format!("Maintenance Receipt — {}", receipt.month),
        format!(
            "Dear {},\n\nPlease find your maintenance receipt attached.\n\nThank you.",
            receipt.name
        ),
    )
    .with_html(format!(
        "<p>Dear {},</p><p>Please find your maintenance receipt attached.</p><p>Thank you.</p>",
        receipt.name
    ))
    .with_attachment(Attachment::pdf(filename, data));

    mailer.send(&email).await?;

    Ok(())
}

fn mark_notified(db_connection: &Arc<Mutex<Connection>>, receipt: &Receipt) -> Result<(), Error> {
    let connection = lock_connection(db_connection)?;
    mark_receipt_notified(receipt.id, OffsetDateTime::now_utc(), &connection)
}

/// Keep flat numbers like "A-101" readable while stopping path separators
/// from escaping the temp directory.
fn sanitise_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sends the current month's receipts using the society's local time.
pub struct MonthlyReceiptNotifier {
    db_connection: Arc<Mutex<Connection>>,
    mailer: Arc<dyn Mailer>,
    config: NotifierConfig,
    local_timezone: String,
}

impl MonthlyReceiptNotifier {
    /// Create a notifier that works out the current month in `local_timezone`.
    pub fn new(
        db_connection: Arc<Mutex<Connection>>,
        mailer: Arc<dyn Mailer>,
        config: NotifierConfig,
        local_timezone: &str,
    ) -> Self {
        Self {
            db_connection,
            mailer,
            config,
            local_timezone: local_timezone.to_owned(),
        }
    }

    /// Send every pending receipt for the current month.
    ///
    /// # Errors
    /// Returns an error if the pending receipts could not be read. Failures
    /// for individual receipts are counted in the report instead.
    pub async fn run_once(&self) -> Result<NotifierReport, Error> {
        let now = local_now(&self.local_timezone)?;

        send_monthly_receipts(&self.db_connection, self.mailer.as_ref(), &self.config, now).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::PathBuf,
        sync::{Arc, Mutex},
    };

    use rusqlite::Connection;
    use time::{Month, macros::datetime};

    use crate::{
        mail::Mailer,
        notifier::Society,
        owner::{NewOwner, create_owner},
        receipt::{NewReceipt, create_receipt, get_all_receipts},
        test_utils::{FailingMailer, RecordingMailer, get_test_connection},
    };

    use super::{
        NotifierConfig, NotifierReport, get_pending_receipt_notices, sanitise_filename,
        send_monthly_receipts,
    };

    fn temp_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "society_rs_{test_name}_{}",
            std::process::id()
        ))
    }

    fn config(test_name: &str) -> NotifierConfig {
        NotifierConfig {
            temp_dir: temp_dir(test_name),
            society: Society {
                name: "Green Meadows Society".to_owned(),
                address: "12 Park Road, Indore".to_owned(),
            },
        }
    }

    fn add_owner(flat_no: &str, email: Option<&str>, conn: &Connection) {
        create_owner(
            &NewOwner {
                flat_no: flat_no.to_owned(),
                name: format!("Owner of {flat_no}"),
                contact: "9999999999".to_owned(),
                sqft: 1000,
                parking: None,
                email: email.map(str::to_owned),
            },
            conn,
        )
        .unwrap();
    }

    fn add_receipt(flat_no: &str, month: &str, conn: &Connection) {
        create_receipt(
            &NewReceipt {
                flat_no: flat_no.to_owned(),
                name: format!("Owner of {flat_no}"),
                month: month.to_owned(),
                mode: "UPI".to_owned(),
                amount: 2500.0,
                ..Default::default()
            },
            time::macros::date!(2025 - 09 - 01),
            conn,
        )
        .unwrap();
    }

    /// Owners A and B have email, C does not. Only September receipts are due.
    fn seed() -> Arc<Mutex<Connection>> {
        let conn = get_test_connection();
        add_owner("A-101", Some("a@x.com"), &conn);
        add_owner("B-202", Some("b@x.com"), &conn);
        add_owner("C-303", None, &conn);
        add_receipt("A-101", "Sep-25", &conn);
        add_receipt("B-202", "sep-25", &conn);
        add_receipt("C-303", "Sep-25", &conn);
        add_receipt("A-101", "Aug-25", &conn);
        add_receipt("Z-999", "Sep-25", &conn);

        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn selects_current_month_receipts_with_email() {
        let db = seed();
        let conn = db.lock().unwrap();

        let notices = get_pending_receipt_notices(2025, Month::September, &conn).unwrap();

        let emails: Vec<&str> = notices.iter().map(|notice| notice.email.as_str()).collect();
        assert_eq!(emails, ["a@x.com", "b@x.com"]);
    }

    #[tokio::test]
    async fn sends_receipts_and_marks_them_notified() {
        let db = seed();
        let mailer = RecordingMailer::default();
        let config = config("sends");

        let report = send_monthly_receipts(&db, &mailer, &config, datetime!(2025-09-01 00:01 +05:30))
            .await
            .unwrap();

        assert_eq!(report, NotifierReport { sent: 2, failed: 0 });
        let sent = mailer.sent();
        assert_eq!(sent[0].to, "a@x.com");
        assert_eq!(sent[0].subject, "Maintenance Receipt — Sep-25");
        assert_eq!(sent[0].attachments[0].filename, "receipt_A-101_2025-09.pdf");
        assert!(sent[0].attachments[0].data.starts_with(b"%PDF"));
        assert!(!config.temp_dir.join("receipt_A-101_2025-09.pdf").exists());

        let conn = db.lock().unwrap();
        let notified = get_all_receipts(&conn)
            .unwrap()
            .into_iter()
            .filter(|receipt| receipt.notified_at.is_some())
            .count();
        assert_eq!(notified, 2);
    }

    #[tokio::test]
    async fn rerun_sends_nothing_new() {
        let db = seed();
        let mailer = RecordingMailer::default();
        let config = config("rerun");
        let now = datetime!(2025-09-01 00:01 +05:30);

        send_monthly_receipts(&db, &mailer, &config, now).await.unwrap();
        let report = send_monthly_receipts(&db, &mailer, &config, now).await.unwrap();

        assert_eq!(report, NotifierReport::default());
        assert_eq!(mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn failed_sends_are_counted_and_cleaned_up() {
        let db = seed();
        let mailer: Arc<dyn Mailer> = Arc::new(FailingMailer);
        let config = config("failing");

        let report = send_monthly_receipts(
            &db,
            mailer.as_ref(),
            &config,
            datetime!(2025-09-01 00:01 +05:30),
        )
        .await
        .unwrap();

        assert_eq!(report, NotifierReport { sent: 0, failed: 2 });
        assert!(!config.temp_dir.join("receipt_A-101_2025-09.pdf").exists());
        assert!(!config.temp_dir.join("receipt_B-202_2025-09.pdf").exists());

        let conn = db.lock().unwrap();
        assert!(get_all_receipts(&conn)
            .unwrap()
            .iter()
            .all(|receipt| receipt.notified_at.is_none()));
    }

    #[test]
    fn sanitises_flat_numbers() {
        assert_eq!(sanitise_filename("A-101"), "A-101");
        assert_eq!(sanitise_filename("../B/202"), "___B_202");
    }
}
