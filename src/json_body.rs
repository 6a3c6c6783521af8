//! Parsing of JSON request bodies into the typed forms used by the endpoints.
//!
//! Endpoints take the raw body as bytes and parse it here instead of using
//! `axum::Json`, so that path validation (e.g., the table allow-list) runs
//! first and malformed bodies become a [Error::Validation] with a JSON error
//! body instead of a plain-text rejection.

use serde::de::DeserializeOwned;

use crate::Error;

/// Deserialize `body` as JSON into `T`.
///
/// An empty body is treated as an empty JSON object so that missing required
/// fields are reported by the form's own validation.
///
/// # Errors
/// Returns [Error::Validation] if the body is not valid JSON for `T`.
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };

    serde_json::from_slice(body).map_err(|error| Error::Validation(format!("Invalid body: {error}")))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use crate::Error;

    use super::parse_json_body;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Form {
        #[serde(default)]
        name: String,
    }

    #[test]
    fn empty_body_is_empty_object() {
        let form: Form = parse_json_body(b"").unwrap();

        assert_eq!(form, Form { name: String::new() });
    }

    #[test]
    fn parses_fields() {
        let form: Form = parse_json_body(br#"{"name": "A-101"}"#).unwrap();

        assert_eq!(form.name, "A-101");
    }

    #[test]
    fn malformed_json_is_validation_error() {
        let result: Result<Form, Error> = parse_json_body(b"{name");

        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
