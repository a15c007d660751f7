//! Error types for the SMTP client.

use std::io;

use thiserror::Error;

/// Errors that can occur when talking to the relay.
#[derive(Error, Debug)]
pub enum ClientError {
    /// IO error occurred during network operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse an SMTP response from the server.
    #[error("Failed to parse SMTP response: {0}")]
    Parse(String),

    /// The server returned a status code outside the expected ranges.
    #[error("Unexpected SMTP status code: {code} - {message}")]
    UnexpectedResponse { code: u16, message: String },

    /// The server returned an error status code (4xx or 5xx).
    #[error("SMTP error: {code} - {message}")]
    Smtp { code: u16, message: String },

    /// The server rejected the credential during the AUTH exchange.
    #[error("Authentication rejected: {code} - {message}")]
    AuthRejected { code: u16, message: String },

    /// TLS/SSL error occurred.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Invalid message construction.
    #[error("Invalid message: {0}")]
    Builder(String),

    /// Connection was closed unexpectedly.
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// A network operation exceeded its timeout.
    #[error("Timed out during {0}")]
    Timeout(String),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Specialized `Result` type for SMTP client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
