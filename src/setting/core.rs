use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, database_id::DatabaseId};

/// The key of the setting holding the balance carried over from before the
/// first recorded receipt or expense.
pub const INITIAL_BALANCE: &str = "initial_balance";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Setting {
    pub id: DatabaseId,
    pub setting_key: String,
    pub value: String,
}

/// The body for creating or replacing a setting.
///
/// `value` may be any JSON value. Strings are stored as is and everything
/// else is stored as its JSON text, so `1000` and `"1000"` are equivalent.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingForm {
    #[serde(default, alias = "key")]
    pub setting_key: String,
    #[serde(default)]
    pub value: Value,
}

impl SettingForm {
    fn value_as_text(&self) -> Option<String> {
        match &self.value {
            Value::Null => None,
            Value::String(value) => Some(value.clone()),
            value => Some(value.to_string()),
        }
    }
}

pub fn create_setting_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS setting (
            id INTEGER PRIMARY KEY,
            setting_key TEXT NOT NULL UNIQUE,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// # Errors
/// Returns [Error::NotFound] if the setting does not exist.
pub fn get_setting(key: &str, connection: &Connection) -> Result<Setting, Error> {
    connection
        .query_row(
            "SELECT id, setting_key, value FROM setting WHERE setting_key = ?1",
            params![key],
            |row| {
                Ok(Setting {
                    id: row.get(0)?,
                    setting_key: row.get(1)?,
                    value: row.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound("Setting not found".to_owned()))
}

/// Create the setting or replace its value if it already exists.
///
/// # Errors
/// Returns [Error::Validation] if the key is blank or the value is missing.
pub fn upsert_setting(form: &SettingForm, connection: &Connection) -> Result<Setting, Error> {
    let key = form.setting_key.trim();
    let value = form.value_as_text();

    let value = match value {
        Some(value) if !key.is_empty() => value,
        _ => {
            return Err(Error::Validation(
                "setting_key and value are required".to_owned(),
            ));
        }
    };

    connection.execute(
        "INSERT INTO setting (setting_key, value) VALUES (?1, ?2)
        ON CONFLICT(setting_key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;

    get_setting(key, connection)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{Error, db::initialize};

    use super::{INITIAL_BALANCE, SettingForm, get_setting, upsert_setting};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn form(value: serde_json::Value) -> SettingForm {
        serde_json::from_value(json!({ "setting_key": INITIAL_BALANCE, "value": value })).unwrap()
    }

    #[test]
    fn upsert_replaces_value() {
        let conn = get_test_connection();

        let first = upsert_setting(&form(json!("1000")), &conn).unwrap();
        let second = upsert_setting(&form(json!("2500")), &conn).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(get_setting(INITIAL_BALANCE, &conn).unwrap().value, "2500");
    }

    #[test]
    fn numbers_are_stored_as_text() {
        let conn = get_test_connection();

        let setting = upsert_setting(&form(json!(1000.5)), &conn).unwrap();

        assert_eq!(setting.value, "1000.5");
    }

    #[test]
    fn accepts_key_alias() {
        let form: SettingForm =
            serde_json::from_value(json!({ "key": "initial_balance", "value": "5" })).unwrap();

        assert_eq!(form.setting_key, INITIAL_BALANCE);
    }

    #[test]
    fn missing_value_is_rejected() {
        let conn = get_test_connection();

        let result = upsert_setting(&form(serde_json::Value::Null), &conn);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn missing_setting_is_not_found() {
        let conn = get_test_connection();

        assert_eq!(
            get_setting("nope", &conn),
            Err(Error::NotFound("Setting not found".to_owned()))
        );
    }
}
