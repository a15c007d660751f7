//! Per-request delivery status tracking.

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// The lifecycle state of one send request.
///
/// Created as `Pending` at admission and moved exactly once to `Sent` or
/// `Failed` by the dispatcher. Terminal states never revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Admitted, delivery not yet concluded.
    Pending,
    /// The relay accepted the message.
    Sent,
    /// All attempts failed; carries the last error reason.
    Failed(String),
}

impl DeliveryStatus {
    /// Returns `true` for `Sent` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Sent => write!(f, "sent"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Aggregate registry counts, as served by the queue stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub pending: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Process-wide mapping from request identifier to delivery status.
///
/// Cloning shares the underlying map. Identifiers are generated fresh per
/// request and never reused, so concurrent writers only ever touch their own
/// key; entries are never removed for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct StatusRegistry {
    entries: Arc<DashMap<Uuid, DeliveryStatus>>,
}

impl StatusRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly admitted request as pending.
    pub fn insert_pending(&self, request_id: Uuid) {
        self.entries.insert(request_id, DeliveryStatus::Pending);
    }

    /// Move a request to its terminal state.
    ///
    /// A request that is already terminal is left untouched; the first
    /// terminal transition wins.
    pub fn complete(&self, request_id: Uuid, status: DeliveryStatus) {
        if let Some(mut entry) = self.entries.get_mut(&request_id)
            && !entry.value().is_terminal()
        {
            *entry.value_mut() = status;
        }
    }

    /// Look up the status of a request.
    #[must_use]
    pub fn get(&self, request_id: &Uuid) -> Option<DeliveryStatus> {
        self.entries
            .get(request_id)
            .map(|entry| entry.value().clone())
    }

    /// Number of requests ever registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aggregate counts over all entries.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total: 0,
            pending: 0,
            sent: 0,
            failed: 0,
        };

        for entry in self.entries.iter() {
            stats.total += 1;
            match entry.value() {
                DeliveryStatus::Pending => stats.pending += 1,
                DeliveryStatus::Sent => stats.sent += 1,
                DeliveryStatus::Failed(_) => stats.failed += 1,
            }
        }

        stats
    }
}
