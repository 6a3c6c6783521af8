//! Outgoing email: OTP codes and monthly receipts.

mod email;
mod smtp;

use async_trait::async_trait;

pub use email::{Attachment, Email};
pub use smtp::{MailConfig, SmtpMailer};

/// Errors that can occur while building or sending an email.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The SMTP transport could not be created.
    #[error("SMTP transport error: {0}")]
    Transport(String),

    /// The SMTP server rejected the message or could not be reached.
    #[error("failed to send email: {0}")]
    Send(String),

    /// The message could not be assembled.
    #[error("failed to build email: {0}")]
    BuildEmail(String),

    /// A sender or recipient address could not be parsed.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// Something that can deliver an [Email].
///
/// The server uses [SmtpMailer]; tests substitute a recording double.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `email`, returning once the server has accepted it.
    ///
    /// # Errors
    /// Returns a [MailError] if the message could not be built or delivered.
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}
