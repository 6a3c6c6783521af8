use rand::{Rng, rngs::OsRng};
use rusqlite::{Connection, params};
use time::{Duration, OffsetDateTime};

use crate::{Error, database_id::DatabaseId};

/// How long a code stays valid after it is issued.
pub const OTP_LIFETIME: Duration = Duration::minutes(5);

pub fn create_otp_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS otp (
            id INTEGER PRIMARY KEY,
            flat_no TEXT NOT NULL,
            code TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_otp_flat_no ON otp(flat_no);",
        (),
    )?;

    Ok(())
}

/// Generate a five digit code using the operating system's secure RNG.
pub fn generate_code() -> String {
    OsRng.gen_range(10000..=99999).to_string()
}

/// Store `code` for `flat_no`, valid for [OTP_LIFETIME] from `now`.
///
/// Codes issued earlier for the same flat are left in place and remain valid
/// until they expire.
pub fn insert_otp(
    flat_no: &str,
    code: &str,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO otp (flat_no, code, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![flat_no, code, now + OTP_LIFETIME, now],
    )?;

    Ok(())
}

/// Find the most recently issued code for `flat_no` matching `code` that
/// expires after `now`.
///
/// Returns the row id of the matching code, if any.
pub fn find_valid_otp(
    flat_no: &str,
    code: &str,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Option<DatabaseId>, Error> {
    let mut statement = connection.prepare(
        "SELECT id, expires_at FROM otp WHERE flat_no = ?1 AND code = ?2 ORDER BY id DESC",
    )?;
    let rows = statement.query_map(params![flat_no, code], |row| {
        Ok((row.get::<_, DatabaseId>(0)?, row.get::<_, OffsetDateTime>(1)?))
    })?;

    for row in rows {
        let (id, expires_at) = row?;

        if expires_at > now {
            return Ok(Some(id));
        }
    }

    Ok(None)
}

/// Delete every code issued for `flat_no`.
pub fn delete_otps_for_flat(flat_no: &str, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM otp WHERE flat_no = ?1", params![flat_no])
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Duration, macros::datetime};

    use crate::db::initialize;

    use super::{delete_otps_for_flat, find_valid_otp, generate_code, insert_otp};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn codes_have_five_digits() {
        for _ in 0..100 {
            let code = generate_code();

            assert_eq!(code.len(), 5);
            assert!(code.bytes().all(|byte| byte.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn finds_code_before_expiry() {
        let conn = get_test_connection();
        let now = datetime!(2025-09-10 08:30 UTC);
        insert_otp("A-101", "12345", now, &conn).unwrap();

        let got = find_valid_otp("A-101", "12345", now + Duration::minutes(4), &conn).unwrap();

        assert!(got.is_some());
    }

    #[test]
    fn expired_code_is_rejected() {
        let conn = get_test_connection();
        let now = datetime!(2025-09-10 08:30 UTC);
        insert_otp("A-101", "12345", now, &conn).unwrap();

        let got = find_valid_otp("A-101", "12345", now + Duration::minutes(5), &conn).unwrap();

        assert_eq!(got, None);
    }

    #[test]
    fn wrong_code_or_flat_is_rejected() {
        let conn = get_test_connection();
        let now = datetime!(2025-09-10 08:30 UTC);
        insert_otp("A-101", "12345", now, &conn).unwrap();

        assert_eq!(find_valid_otp("A-101", "54321", now, &conn).unwrap(), None);
        assert_eq!(find_valid_otp("B-202", "12345", now, &conn).unwrap(), None);
    }

    #[test]
    fn earlier_codes_stay_valid() {
        let conn = get_test_connection();
        let now = datetime!(2025-09-10 08:30 UTC);
        insert_otp("A-101", "11111", now, &conn).unwrap();
        insert_otp("A-101", "22222", now + Duration::minutes(1), &conn).unwrap();

        let got = find_valid_otp("A-101", "11111", now + Duration::minutes(2), &conn).unwrap();

        assert!(got.is_some());
    }

    #[test]
    fn delete_removes_all_codes_for_flat() {
        let conn = get_test_connection();
        let now = datetime!(2025-09-10 08:30 UTC);
        insert_otp("A-101", "11111", now, &conn).unwrap();
        insert_otp("A-101", "22222", now, &conn).unwrap();
        insert_otp("B-202", "33333", now, &conn).unwrap();

        assert_eq!(delete_otps_for_flat("A-101", &conn), Ok(2));
        assert!(find_valid_otp("B-202", "33333", now, &conn).unwrap().is_some());
    }
}
