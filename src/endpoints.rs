//! The API endpoints URIs.
//!
//! For endpoints that take parameters, e.g., '/api/{table}/{id}', use [format_endpoint].

/// The route to list rows of a table or create a row.
pub const TABLE: &str = "/api/{table}";
/// The route to read, update or delete a single row of a table.
pub const TABLE_ROW: &str = "/api/{table}/{id}";
/// The route for emailing an OTP to the owner of a flat.
pub const SEND_OTP: &str = "/api/send-otp";
/// The route for exchanging an OTP for an owner session.
pub const VERIFY_OTP: &str = "/api/verify-otp";
/// The route for logging in as the admin.
pub const LOG_IN: &str = "/api/log_in";
/// The route for the client to log out.
pub const LOG_OUT: &str = "/api/log_out";
/// The route describing the caller's session.
pub const SESSION: &str = "/api/session";
/// The route for the balance summary.
pub const BALANCE: &str = "/api/balance";
/// The route for creating or replacing a setting.
pub const SETTINGS: &str = "/api/settings";
/// The route for reading a single setting.
pub const SETTING: &str = "/api/settings/{key}";
/// The route for checking the server and database are up.
pub const HEALTH: &str = "/api/test";

/// Replace the first parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/{table}', '{table}' is the parameter.
/// Call this once per parameter for paths with several of them.
///
/// This function assumes that an endpoint path only contains ASCII characters.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, value: impl std::fmt::Display) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}
