//! An extractor for the identity of the caller.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{
    Error,
    auth::{Role, get_token_from_cookies},
};

/// The caller as identified by their session cookie.
///
/// Requests without a valid, unexpired session are treated as [Role::Guest],
/// so extracting a viewer never fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    /// Guest, owner or admin.
    pub role: Role,
    /// The flat an owner signed in for. Always `None` for guests and the admin.
    pub flat_no: Option<String>,
}

impl Viewer {
    /// A caller without a session.
    pub fn guest() -> Self {
        Self {
            role: Role::Guest,
            flat_no: None,
        }
    }

    /// The society admin.
    #[cfg(test)]
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            flat_no: None,
        }
    }

    /// The owner of `flat_no`.
    #[cfg(test)]
    pub fn owner(flat_no: &str) -> Self {
        Self {
            role: Role::Owner,
            flat_no: Some(flat_no.to_owned()),
        }
    }

    /// Whether the viewer is the society admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// # Errors
    /// Returns [Error::SignInRequired] for guests.
    pub fn require_signed_in(&self) -> Result<(), Error> {
        if self.role == Role::Guest {
            Err(Error::SignInRequired)
        } else {
            Ok(())
        }
    }

    /// The flat of a signed in owner.
    pub fn owner_flat(&self) -> Option<&str> {
        match self.role {
            Role::Owner => self.flat_no.as_deref(),
            Role::Admin | Role::Guest => None,
        }
    }

    /// # Errors
    /// Returns [Error::Forbidden] unless the viewer is the admin.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }

    /// Whether the viewer is the owner of `flat_no`, ignoring case.
    pub fn owns_flat(&self, flat_no: &str) -> bool {
        self.role == Role::Owner
            && self
                .flat_no
                .as_deref()
                .is_some_and(|own_flat| own_flat.eq_ignore_ascii_case(flat_no))
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar = PrivateCookieJar::from_request_parts(parts, state).await?;

        Ok(match get_token_from_cookies(&jar) {
            Some(token) => Self {
                role: token.role,
                flat_no: token.flat_no,
            },
            None => Self::guest(),
        })
    }
}
