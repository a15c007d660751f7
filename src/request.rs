//! Inbound send requests and their validation.
//!
//! A raw [`SendEmailRequest`] comes straight off the wire and may be missing
//! anything; [`EmailRequest::validate`] is the only way to obtain an
//! [`EmailRequest`], so downstream code never sees malformed input.

use serde::Deserialize;
use thiserror::Error;

/// Maximum accepted subject length, in characters.
pub const MAX_SUBJECT_CHARS: usize = 255;

/// Maximum accepted body length, in characters.
pub const MAX_BODY_CHARS: usize = 10_000;

/// Rejection reasons surfaced to the submitting client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Subject, recipient, or body is absent or empty.
    #[error("Missing required fields")]
    MissingField,

    /// The recipient does not look like `local@domain.tld`.
    #[error("Invalid email format")]
    InvalidAddress,

    /// Subject or body exceeds the configured character caps.
    #[error("Subject or body exceeds character limits")]
    LengthExceeded,
}

/// A send request as received over HTTP, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_html: bool,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
}

/// A validated, immutable send request.
///
/// Owned solely by the dispatch job created from it.
#[derive(Debug, Clone)]
pub struct EmailRequest {
    subject: String,
    recipient: String,
    body: String,
    is_html: bool,
    cc: Option<String>,
    bcc: Option<String>,
}

impl EmailRequest {
    /// Validate a raw request.
    ///
    /// Checks, in order: required fields present and non-empty, recipient
    /// address shape, subject/body length caps. The caps are inclusive:
    /// a 255-character subject and a 10000-character body are accepted.
    ///
    /// Cc and bcc are passed through unchecked.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as a [`ValidationError`].
    pub fn validate(raw: SendEmailRequest) -> Result<Self, ValidationError> {
        let (subject, recipient, body) = match (raw.subject, raw.recipient, raw.body) {
            (Some(subject), Some(recipient), Some(body))
                if !subject.is_empty() && !recipient.is_empty() && !body.is_empty() =>
            {
                (subject, recipient, body)
            }
            _ => return Err(ValidationError::MissingField),
        };

        if !is_valid_address(&recipient) {
            return Err(ValidationError::InvalidAddress);
        }

        if subject.chars().count() > MAX_SUBJECT_CHARS || body.chars().count() > MAX_BODY_CHARS {
            return Err(ValidationError::LengthExceeded);
        }

        Ok(Self {
            subject,
            recipient,
            body,
            is_html: raw.is_html,
            cc: raw.cc,
            bcc: raw.bcc,
        })
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub const fn is_html(&self) -> bool {
        self.is_html
    }

    #[must_use]
    pub fn cc(&self) -> Option<&str> {
        self.cc.as_deref()
    }

    #[must_use]
    pub fn bcc(&self) -> Option<&str> {
        self.bcc.as_deref()
    }

    /// All envelope recipients: to, then cc, then bcc.
    #[must_use]
    pub fn envelope_recipients(&self) -> Vec<&str> {
        let mut recipients = vec![self.recipient.as_str()];
        recipients.extend(self.cc.as_deref());
        recipients.extend(self.bcc.as_deref());
        recipients
    }
}

/// Check the basic `local@domain.tld` address shape: exactly one `@`, a
/// non-empty local part, and a dot in the domain with text on both sides.
fn is_valid_address(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .split_once('.')
        .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
}
