//! Typed error handling for dispatch operations.
//!
//! Delivery failures are split into:
//! - Transient failures (4xx SMTP codes, network errors) - candidates for retry
//! - Fatal failures (5xx SMTP codes, rejected credentials) - retry will not help
//!
//! The dispatcher currently retries both classes alike; the split exists so
//! callers can still tell them apart when reading a terminal status.

use thiserror::Error;

use crate::client::ClientError;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transient failure that may succeed on a later attempt.
    #[error("Transient failure: {0}")]
    Transient(#[from] TransientError),

    /// Fatal failure that no amount of retrying will fix.
    #[error("Fatal failure: {0}")]
    Fatal(#[from] FatalError),
}

/// Failures that are expected to be recoverable.
///
/// These correspond to 4xx SMTP response codes or transient network issues.
#[derive(Debug, Error)]
pub enum TransientError {
    /// Failed to establish a connection to the relay.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An operation exceeded its configured timeout.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The TLS upgrade failed.
    #[error("TLS handshake failed: {0}")]
    TlsHandshakeFailed(String),

    /// The relay returned a temporary failure code.
    #[error("Temporary SMTP error: {0}")]
    SmtpTemporary(String),
}

/// Failures that will not succeed on retry.
///
/// These correspond to 5xx SMTP response codes or unrecoverable
/// configuration issues.
#[derive(Debug, Error)]
pub enum FatalError {
    /// The relay rejected the message outright.
    #[error("Message rejected: {0}")]
    MessageRejected(String),

    /// The relay rejected the configured credential.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The message could not be composed.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The relay violated the SMTP protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl DeliveryError {
    /// Returns `true` if this error is transient and may succeed on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Returns `true` if this error is fatal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Convert from SMTP [`ClientError`] to [`DeliveryError`].
///
/// Errors are categorized by SMTP response code class:
///
/// - **4xx codes** -> Transient
/// - **5xx codes** -> Fatal
/// - **Connection/I/O errors** -> Transient (network issues pass)
/// - **TLS errors** -> Transient
/// - **Parse errors** -> Fatal (protocol violation)
impl From<ClientError> for DeliveryError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Smtp { code, message } if (400..500).contains(&code) => {
                Self::Transient(TransientError::SmtpTemporary(format!("{code} {message}")))
            }

            ClientError::Smtp { code, message }
            | ClientError::UnexpectedResponse { code, message } => {
                Self::Fatal(FatalError::MessageRejected(format!("{code} {message}")))
            }

            ClientError::AuthRejected { code, message } if (400..500).contains(&code) => {
                Self::Transient(TransientError::SmtpTemporary(format!("{code} {message}")))
            }

            ClientError::AuthRejected { code, message } => Self::Fatal(
                FatalError::AuthenticationFailed(format!("{code} {message}")),
            ),

            ClientError::Io(e) => {
                Self::Transient(TransientError::ConnectionFailed(format!("I/O error: {e}")))
            }

            ClientError::ConnectionClosed => Self::Transient(TransientError::ConnectionFailed(
                "Connection closed unexpectedly".to_string(),
            )),

            ClientError::Timeout(op) => Self::Transient(TransientError::Timeout(op)),

            ClientError::Tls(msg) => Self::Transient(TransientError::TlsHandshakeFailed(msg)),

            ClientError::Parse(msg) => Self::Fatal(FatalError::Protocol(msg)),

            ClientError::Builder(msg) => Self::Fatal(FatalError::InvalidMessage(msg)),

            ClientError::Utf8(e) => {
                Self::Fatal(FatalError::Protocol(format!("UTF-8 decoding error: {e}")))
            }
        }
    }
}

/// Errors that can occur while running the HTTP surface.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("Failed to bind server to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// The server encountered a runtime error.
    #[error("Server error: {0}")]
    Server(String),
}
