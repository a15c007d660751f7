//! Audit logging for delivery attempts.
//!
//! Every attempt - success or failure - lands as one row in an append-only
//! CSV file and as a structured tracing event. The file is created with a
//! header row on first open and never truncated or rewritten; each append is
//! a single write of one complete line, so rows from concurrent workers
//! never interleave.

use std::{
    fmt::{self, Display},
    io,
    path::{Path, PathBuf},
};

use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};
use uuid::Uuid;

/// Header row written once when the file is created.
const HEADER: &str = "Request ID,Sender Email,Recipient,Subject,Date,Status\n";

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Sent,
    Failed,
}

impl Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One row of the audit log.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub request_id: Uuid,
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub status: AuditStatus,
    /// Appended as a trailing column when present.
    pub error_detail: Option<String>,
}

/// Append-only audit sink.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLog {
    /// Open the audit log, creating it with a header row if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the header cannot
    /// be written.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .await?;

        if file.metadata().await?.len() == 0 {
            file.write_all(HEADER.as_bytes()).await?;
            file.flush().await?;
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path the log writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, timestamped at the moment of the append.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; prior rows are unaffected.
    pub async fn append(&self, record: &AuditRecord) -> io::Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        let mut line = format!(
            "{},{},{},{},{},{}",
            record.request_id,
            escape_field(&record.sender),
            escape_field(&record.recipient),
            escape_field(&record.subject),
            timestamp,
            record.status,
        );
        if let Some(detail) = &record.error_detail {
            line.push(',');
            line.push_str(&escape_field(detail));
        }
        line.push('\n');

        {
            let mut file = self.file.lock().await;
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }

        match record.status {
            AuditStatus::Sent => tracing::event!(
                tracing::Level::INFO,
                event = "DeliverySuccess",
                request_id = %record.request_id,
                recipient = %record.recipient,
                "Audit: delivery successful"
            ),
            AuditStatus::Failed => tracing::event!(
                tracing::Level::WARN,
                event = "DeliveryFailure",
                request_id = %record.request_id,
                recipient = %record.recipient,
                error = record.error_detail.as_deref().unwrap_or(""),
                "Audit: delivery attempt failed"
            ),
        }

        Ok(())
    }
}

/// Quote a CSV field when it contains a separator, quote, or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
