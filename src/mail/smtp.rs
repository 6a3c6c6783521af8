use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{
        Attachment as LettreAttachment, Mailbox, MultiPart, SinglePart, header::ContentType,
    },
    transport::smtp::authentication::Credentials,
};
use secrecy::{ExposeSecret, SecretString};

use crate::mail::{Email, MailError, Mailer};

/// Settings for the SMTP relay.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Host name of the relay, e.g. "smtp.gmail.com".
    pub smtp_host: String,
    /// Usually 587 for STARTTLS.
    pub smtp_port: u16,
    /// The account used to authenticate with the relay.
    pub username: String,
    password: SecretString,
    /// The sender address. Usually the same as `username`.
    pub from_address: String,
}

impl MailConfig {
    /// Create a config. Mail is sent from `username` unless `from_address` is
    /// given.
    pub fn new(
        smtp_host: impl Into<String>,
        smtp_port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        from_address: Option<String>,
    ) -> Self {
        let username = username.into();

        Self {
            smtp_host: smtp_host.into(),
            smtp_port,
            from_address: from_address.unwrap_or_else(|| username.clone()),
            username,
            password: SecretString::from(password.into()),
        }
    }

    fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Sends email through an SMTP relay with STARTTLS, e.g. Gmail.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a pooled SMTP transport. No connection is made until the first
    /// email is sent.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(config.username.clone(), config.password().to_owned());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|error| MailError::Transport(error.to_string()))?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        tracing::info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            username = %config.username,
            "Created SMTP mailer"
        );

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    fn build_message(&self, email: &Email) -> Result<Message, MailError> {
        let from = self
            .from_address
            .parse::<Mailbox>()
            .map_err(|error| MailError::InvalidAddress(format!("From: {error}")))?;
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|error| MailError::InvalidAddress(format!("To '{}': {error}", email.to)))?;

        let builder = Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject);

        let body = match &email.html_body {
            Some(html) => MultiPart::alternative()
                .singlepart(SinglePart::plain(email.body.clone()))
                .singlepart(SinglePart::html(html.clone())),
            None => MultiPart::alternative().singlepart(SinglePart::plain(email.body.clone())),
        };

        if email.attachments.is_empty() {
            return builder
                .multipart(body)
                .map_err(|error| MailError::BuildEmail(error.to_string()));
        }

        let mut multipart = MultiPart::mixed().multipart(body);

        for attachment in &email.attachments {
            tracing::debug!(filename = %attachment.filename, "Adding attachment");

            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|error| MailError::BuildEmail(format!("invalid content type: {error}")))?;

            multipart = multipart.singlepart(
                LettreAttachment::new(attachment.filename.clone())
                    .body(attachment.data.clone(), content_type),
            );
        }

        builder
            .multipart(multipart)
            .map_err(|error| MailError::BuildEmail(error.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|error| MailError::Send(error.to_string()))?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}
