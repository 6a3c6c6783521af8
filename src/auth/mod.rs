//! Sessions for owners and the admin, carried in a private cookie.

mod admin;
mod cookie;
mod password;
mod token;
mod viewer;

pub use admin::{
    create_admin_credential_table, log_in_endpoint, log_out_endpoint, session_endpoint,
    set_admin_password,
};
pub use cookie::{
    DEFAULT_COOKIE_DURATION, get_token_from_cookies, invalidate_session_cookie,
    set_session_cookie,
};
pub use password::{PasswordHash, ValidatedPassword};
pub use token::{Role, Token};
pub use viewer::Viewer;

#[cfg(test)]
pub use cookie::COOKIE_SESSION;
