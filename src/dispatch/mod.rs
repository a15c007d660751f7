//! Asynchronous dispatch of admitted send requests.
//!
//! This module provides functionality to:
//! - Carry an admitted request as a [`DispatchJob`]
//! - Drive delivery attempts with bounded retry and backoff
//! - Record terminal outcomes in the status registry and audit log

mod pool;
mod retry;

pub use pool::{SubmitError, WorkerPool};
pub use retry::RetryPolicy;

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    audit::{AuditLog, AuditRecord, AuditStatus},
    client::Transport,
    config::SenderConfig,
    request::EmailRequest,
    status::{DeliveryStatus, StatusRegistry},
};

/// One admitted request on its way to the relay.
///
/// Created at admission, consumed exactly once by a worker, discarded after
/// the terminal outcome is recorded. The sender identity and credential are
/// process-level configuration, shared read-only across jobs.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub request_id: Uuid,
    pub request: EmailRequest,
    pub sender: Arc<SenderConfig>,
}

/// Drives delivery attempts for one job at a time.
///
/// Owns the retry loop: attempt, audit, back off, repeat; then record the
/// terminal state exactly once. Nothing here ever propagates an error back
/// to the admission path.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    registry: StatusRegistry,
    audit_log: Arc<AuditLog>,
    policy: RetryPolicy,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: StatusRegistry,
        audit_log: Arc<AuditLog>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            registry,
            audit_log,
            policy,
        }
    }

    /// Run a job to its terminal outcome.
    ///
    /// The backoff sleep runs right here on the worker task, holding the
    /// pool slot for the full duration.
    pub async fn dispatch(&self, job: DispatchJob) {
        let mut attempt: u32 = 1;

        loop {
            debug!(
                request_id = %job.request_id,
                attempt,
                max_attempts = self.policy.max_attempts,
                "Attempting delivery"
            );

            match self.transport.deliver(&job).await {
                Ok(()) => {
                    self.audit(&job, AuditStatus::Sent, None).await;
                    self.registry.complete(job.request_id, DeliveryStatus::Sent);
                    info!(
                        request_id = %job.request_id,
                        recipient = %job.request.recipient(),
                        attempt,
                        "Delivery successful"
                    );
                    return;
                }
                Err(error) => {
                    let reason = error.to_string();
                    self.audit(&job, AuditStatus::Failed, Some(&reason)).await;

                    if self.policy.should_retry(attempt) {
                        let delay = self.policy.backoff_delay(attempt);
                        warn!(
                            request_id = %job.request_id,
                            attempt,
                            delay_secs = delay.as_secs(),
                            error = %reason,
                            "Delivery attempt failed, backing off before retry"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    } else {
                        warn!(
                            request_id = %job.request_id,
                            attempts = attempt,
                            error = %reason,
                            "Delivery failed after exhausting retries"
                        );
                        self.registry
                            .complete(job.request_id, DeliveryStatus::Failed(reason));
                        return;
                    }
                }
            }
        }
    }

    async fn audit(&self, job: &DispatchJob, status: AuditStatus, error_detail: Option<&str>) {
        let record = AuditRecord {
            request_id: job.request_id,
            sender: job.sender.email.clone(),
            recipient: job.request.recipient().to_string(),
            subject: job.request.subject().to_string(),
            status,
            error_detail: error_detail.map(String::from),
        };

        // An audit write failure must not abort the delivery sequence.
        if let Err(error) = self.audit_log.append(&record).await {
            warn!(
                request_id = %job.request_id,
                error = %error,
                "Failed to append audit record"
            );
        }
    }
}
