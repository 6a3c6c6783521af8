//! Middleware for logging requests and responses.

use axum::{body::Bytes, extract::Request, middleware::Next, response::Response};
use serde_json::Value;

/// The JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 2] = ["otp", "password"];

/// Bodies longer than this many characters are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// OTP codes and passwords in JSON request bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = collect_body(body).await;
    log_request(&parts, &redact_json_fields(&String::from_utf8_lossy(&body)));

    let response = next.run(Request::from_parts(parts, body.into())).await;

    let (parts, body) = response.into_parts();
    let body = collect_body(body).await;
    log_response(&parts, &String::from_utf8_lossy(&body));

    Response::from_parts(parts, body.into())
}

async fn collect_body(body: axum::body::Body) -> Bytes {
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read body for logging: {error}");
            Bytes::new()
        }
    }
}

/// Replace the values of [REDACTED_FIELDS] in a JSON object body.
///
/// Bodies that are not JSON objects are returned unchanged.
fn redact_json_fields(body: &str) -> String {
    let mut json = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => return body.to_owned(),
    };

    let mut redacted = false;
    for field in REDACTED_FIELDS {
        if let Some(value) = json.get_mut(field) {
            *value = Value::String("********".to_owned());
            redacted = true;
        }
    }

    if redacted {
        Value::Object(json).to_string()
    } else {
        body.to_owned()
    }
}

fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(end, _)| &body[..end])
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    match truncate(body) {
        Some(head) => {
            tracing::info!("Received request: {headers:#?}\nbody: {head}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {headers:#?}\nbody: {body:?}"),
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    match truncate(body) {
        Some(head) => {
            tracing::info!("Sending response: {headers:#?}\nbody: {head}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {headers:#?}\nbody: {body:?}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{LOG_BODY_LENGTH_LIMIT, redact_json_fields, truncate};

    #[test]
    fn redacts_otp_and_password() {
        let body = json!({ "flatNo": "A-101", "otp": "12345" }).to_string();

        let redacted: Value = serde_json::from_str(&redact_json_fields(&body)).unwrap();

        assert_eq!(redacted, json!({ "flatNo": "A-101", "otp": "********" }));

        let body = json!({ "password": "hunter2" }).to_string();
        let redacted: Value = serde_json::from_str(&redact_json_fields(&body)).unwrap();

        assert_eq!(redacted, json!({ "password": "********" }));
    }

    #[test]
    fn leaves_other_bodies_alone() {
        assert_eq!(redact_json_fields("otp=12345"), "otp=12345");
        assert_eq!(redact_json_fields(r#"{"flatNo":"A-101"}"#), r#"{"flatNo":"A-101"}"#);
        assert_eq!(redact_json_fields(""), "");
    }

    #[test]
    fn truncates_long_bodies_on_char_boundaries() {
        let short = "a".repeat(LOG_BODY_LENGTH_LIMIT);
        assert_eq!(truncate(&short), None);

        let long = "₹".repeat(LOG_BODY_LENGTH_LIMIT + 1);
        assert_eq!(
            truncate(&long).map(|head| head.chars().count()),
            Some(LOG_BODY_LENGTH_LIMIT)
        );
    }
}
