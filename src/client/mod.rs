//! SMTP relay client with support for STARTTLS and AUTH LOGIN.
//!
//! The [`Transport`] trait is the seam the dispatcher sees: one delivery
//! attempt in, success or a typed failure out. [`SmtpRelayTransport`] is the
//! production implementation; tests substitute their own.

mod client;
mod error;
mod message;
mod response;
mod transport;

pub use client::SmtpClient;
pub use error::ClientError;
pub use message::MessageBuilder;
pub use response::Response;
pub use transport::SmtpRelayTransport;

use async_trait::async_trait;

use crate::{dispatch::DispatchJob, error::DeliveryError};

/// A capability that attempts one delivery of a composed message.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attempt one delivery of the job's message.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] carrying a human-readable cause when the
    /// attempt fails for any reason.
    async fn deliver(&self, job: &DispatchJob) -> Result<(), DeliveryError>;
}
