//! Email message composition with proper MIME headers.

/// Builder for the outbound message payload.
///
/// Handles the From/To/Cc/Subject headers and a plain-text or HTML body.
/// Bcc recipients are deliberately absent here: they belong on the SMTP
/// envelope, never in the transmitted headers.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    cc: Vec<String>,
    subject: Option<String>,
    body: Option<String>,
    html: bool,
}

impl MessageBuilder {
    /// Creates a new empty message builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the From header.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Adds a recipient to the To header.
    #[must_use]
    pub fn to(mut self, email: impl Into<String>) -> Self {
        self.to.push(email.into());
        self
    }

    /// Adds a recipient to the Cc header.
    #[must_use]
    pub fn cc(mut self, email: impl Into<String>) -> Self {
        self.cc.push(email.into());
        self
    }

    /// Sets the Subject header.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the message body content.
    #[must_use]
    pub fn body(mut self, content: impl Into<String>) -> Self {
        self.body = Some(content.into());
        self
    }

    /// Marks the body as HTML rather than plain text.
    #[must_use]
    pub const fn html(mut self, html: bool) -> Self {
        self.html = html;
        self
    }

    /// Builds the final message with CRLF line endings.
    #[must_use]
    pub fn build(self) -> String {
        let mut message = String::with_capacity(1024);

        if let Some(from) = &self.from {
            message.push_str(&format!("From: {from}\r\n"));
        }

        if !self.to.is_empty() {
            message.push_str(&format!("To: {}\r\n", self.to.join(", ")));
        }

        if !self.cc.is_empty() {
            message.push_str(&format!("Cc: {}\r\n", self.cc.join(", ")));
        }

        if let Some(subject) = &self.subject {
            message.push_str(&format!("Subject: {subject}\r\n"));
        }

        message.push_str("MIME-Version: 1.0\r\n");
        if self.html {
            message.push_str("Content-Type: text/html; charset=utf-8\r\n");
        } else {
            message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        }

        // Blank line between headers and body
        message.push_str("\r\n");

        if let Some(body) = &self.body {
            message.push_str(body);
        }

        message
    }
}
