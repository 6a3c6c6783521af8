//! Generates human readable receipt numbers of the form `RCPT-YYYYMMDDNNN`.

use rusqlite::{Connection, params};
use time::Date;

use crate::Error;

/// Build the next receipt number for a receipt issued on `today`.
///
/// The serial is one more than the largest serial among receipt numbers
/// already issued on `today`, so it restarts at `001` each day. Suffixes that
/// are not numeric are ignored. Serials past 999 widen to four digits.
pub fn next_receipt_id(today: Date, connection: &Connection) -> Result<String, Error> {
    let prefix = date_prefix(today);
    let mut statement =
        connection.prepare("SELECT receipt_id FROM receipt WHERE substr(receipt_id, 1, ?1) = ?2")?;
    let receipt_ids = statement
        .query_map(params![prefix.len(), prefix], |row| row.get::<_, String>(0))?;

    let mut max_serial = 0;
    for receipt_id in receipt_ids {
        if let Some(serial) = parse_serial(&receipt_id?, &prefix) {
            max_serial = max_serial.max(serial);
        }
    }

    Ok(format!("{prefix}{:03}", max_serial + 1))
}

fn date_prefix(date: Date) -> String {
    format!(
        "RCPT-{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn parse_serial(receipt_id: &str, prefix: &str) -> Option<u32> {
    let suffix = receipt_id.strip_prefix(prefix)?;

    if !suffix.is_empty() && suffix.bytes().all(|byte| byte.is_ascii_digit()) {
        suffix.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::{Connection, params};
    use time::macros::date;

    use crate::db::initialize;

    use super::{next_receipt_id, parse_serial};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_receipt_id(receipt_id: &str, conn: &Connection) {
        conn.execute(
            "INSERT INTO receipt (receipt_id, date, flat_no, name, month, mode, txn_id, amount)
            VALUES (?1, '2025-09-01', 'A-101', 'Rao', 'Sep-25', 'UPI', '', 100.0)",
            params![receipt_id],
        )
        .unwrap();
    }

    #[test]
    fn first_receipt_gets_serial_one() {
        let conn = get_test_connection();

        let got = next_receipt_id(date!(2025 - 09 - 05), &conn).unwrap();

        assert_eq!(got, "RCPT-20250905001");
    }

    #[test]
    fn serial_follows_largest_serial_of_the_day() {
        let conn = get_test_connection();
        for serial in 1..=9 {
            insert_receipt_id(&format!("RCPT-20250905{serial:03}"), &conn);
        }

        let got = next_receipt_id(date!(2025 - 09 - 05), &conn).unwrap();

        assert_eq!(got, "RCPT-20250905010");
    }

    #[test]
    fn serial_restarts_on_a_new_day() {
        let conn = get_test_connection();
        insert_receipt_id("RCPT-20250801999", &conn);

        let got = next_receipt_id(date!(2025 - 09 - 05), &conn).unwrap();

        assert_eq!(got, "RCPT-20250905001");
    }

    #[test]
    fn serial_keeps_counting_past_999() {
        let conn = get_test_connection();
        insert_receipt_id("RCPT-20250905999", &conn);

        let first = next_receipt_id(date!(2025 - 09 - 05), &conn).unwrap();
        insert_receipt_id(&first, &conn);
        let second = next_receipt_id(date!(2025 - 09 - 05), &conn).unwrap();

        assert_eq!(first, "RCPT-202509051000");
        assert_eq!(second, "RCPT-202509051001");
    }

    #[test]
    fn non_numeric_suffixes_are_ignored() {
        let conn = get_test_connection();
        insert_receipt_id("RCPT-20250905004", &conn);
        insert_receipt_id("RCPT-20250905ABC", &conn);
        insert_receipt_id("MANUAL-ABC", &conn);

        let got = next_receipt_id(date!(2025 - 09 - 05), &conn).unwrap();

        assert_eq!(got, "RCPT-20250905005");
    }

    #[test]
    fn parses_serial_suffix() {
        let prefix = "RCPT-20250901";
        assert_eq!(parse_serial("RCPT-20250901042", prefix), Some(42));
        assert_eq!(parse_serial("RCPT-202509011000", prefix), Some(1000));
        assert_eq!(parse_serial("RCPT-2025090104x", prefix), None);
        assert_eq!(parse_serial("RCPT-20250901", prefix), None);
        assert_eq!(parse_serial("RCPT-20250801042", prefix), None);
    }
}
