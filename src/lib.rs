//! An asynchronous mail submission and dispatch service.
//!
//! This crate provides functionality to:
//! - Admit email-send requests after validation, answering immediately
//! - Dispatch them through an external SMTP relay on a bounded worker pool
//! - Retry transient failures with exponential backoff
//! - Track per-request delivery status, queryable by identifier
//! - Append every delivery attempt to a durable audit log

pub mod audit;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod request;
pub mod server;
pub mod status;

pub use audit::{AuditLog, AuditRecord, AuditStatus};
pub use client::{SmtpRelayTransport, Transport};
pub use config::Config;
pub use dispatch::{DispatchJob, Dispatcher, RetryPolicy, WorkerPool};
pub use error::{DeliveryError, FatalError, TransientError};
pub use request::{EmailRequest, SendEmailRequest, ValidationError};
pub use server::{AppState, Server};
pub use status::{DeliveryStatus, StatusRegistry};

/// Process-level control signal.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
}
