/// An email to a single recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    /// The recipient's address.
    pub to: String,
    /// The subject line.
    pub subject: String,
    /// The plain text body.
    pub body: String,
    /// An HTML alternative to `body`.
    pub html_body: Option<String>,
    /// Files sent along with the message.
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// A plain text email without attachments.
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            html_body: None,
            attachments: Vec::new(),
        }
    }

    /// Add an HTML alternative to the plain text body.
    pub fn with_html(mut self, html_body: impl Into<String>) -> Self {
        self.html_body = Some(html_body.into());
        self
    }

    /// Attach a file.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// A file attached to an [Email].
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// The name shown to the recipient.
    pub filename: String,
    /// A MIME type, e.g. "application/pdf".
    pub content_type: String,
    /// The raw file contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// A PDF attachment.
    pub fn pdf(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/pdf".to_owned(),
            data,
        }
    }
}
