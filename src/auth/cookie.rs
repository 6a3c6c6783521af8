//! Defines functions for storing the session token in a private cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    auth::{Role, Token},
};

/// The name of the cookie holding the session [Token].
pub const COOKIE_SESSION: &str = "session";
/// The default duration for which session cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::hours(1);

/// Add a session cookie for `role` to the cookie jar.
///
/// The token and the cookie both expire `duration` from now.
///
/// # Errors
///
/// Returns [Error::TokenError] if the token cannot be serialised.
pub fn set_session_cookie(
    jar: PrivateCookieJar,
    role: Role,
    flat_no: Option<String>,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc() + duration;
    let token = Token {
        role,
        flat_no,
        expires_at,
    };
    let token_string =
        serde_json::to_string(&token).map_err(|error| Error::TokenError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_SESSION, token_string))
            .expires(expires_at)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the session token from `jar` if there is one and it has not expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Option<Token> {
    let cookie = jar.get(COOKIE_SESSION)?;

    let token: Token = match serde_json::from_str(cookie.value_trimmed()) {
        Ok(token) => token,
        Err(error) => {
            tracing::debug!("Ignoring malformed session token: {error}");
            return None;
        }
    };

    if token.expires_at <= OffsetDateTime::now_utc() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
    use time::{Duration, OffsetDateTime};

    use crate::{
        app_state::create_cookie_key,
        auth::{Role, Token},
    };

    use super::{
        COOKIE_SESSION, DEFAULT_COOKIE_DURATION, get_token_from_cookies,
        invalidate_session_cookie, set_session_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(create_cookie_key("foobar"))
    }

    /// Test helper macro to assert that two date times are within one second
    /// of each other. Used instead of a function so that the file and line
    /// number of the caller is included in the error message instead of the
    /// helper.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(1),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    #[test]
    fn can_set_cookie() {
        let jar = set_session_cookie(
            get_jar(),
            Role::Owner,
            Some("A-101".to_owned()),
            DEFAULT_COOKIE_DURATION,
        )
        .unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        let cookie = jar.get(COOKIE_SESSION).unwrap();

        assert_eq!(token.role, Role::Owner);
        assert_eq!(token.flat_no.as_deref(), Some("A-101"));
        assert_date_time_close!(token.expires_at, OffsetDateTime::now_utc() + Duration::hours(1));
        assert_date_time_close!(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + Duration::hours(1)
        );
    }

    #[test]
    fn expired_token_is_ignored() {
        let token = Token {
            role: Role::Admin,
            flat_no: None,
            expires_at: OffsetDateTime::now_utc() - Duration::minutes(1),
        };
        let jar = get_jar().add(Cookie::new(
            COOKIE_SESSION,
            serde_json::to_string(&token).unwrap(),
        ));

        assert_eq!(get_token_from_cookies(&jar), None);
    }

    #[test]
    fn malformed_token_is_ignored() {
        let jar = get_jar().add(Cookie::new(COOKIE_SESSION, "not json"));

        assert_eq!(get_token_from_cookies(&jar), None);
    }

    #[test]
    fn invalidate_session_cookie_succeeds() {
        let jar = set_session_cookie(get_jar(), Role::Admin, None, DEFAULT_COOKIE_DURATION).unwrap();

        let jar = invalidate_session_cookie(jar);
        let cookie = jar.get(COOKIE_SESSION).unwrap();

        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(get_token_from_cookies(&jar), None);
    }
}
