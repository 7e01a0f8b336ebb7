//! Delivery journal.
//!
//! One line is appended per send attempt:
//!
//! ```text
//! 2025-03-01 14:07:12 - Email sent to ['a@x.com', 'b@y.com']
//! 2025-03-01 14:09:30 - Email failed (Delivery failed: relay denied (exit 1)) to ['a@x.com']
//! ```
//!
//! The sink is opened append-only and closed again for every record, and each
//! record is a single write call, so concurrent senders never interleave
//! within a line.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::errors::{MailError, MailResult};

/// Timestamp rendering, local time at second precision.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The transport accepted the message.
    Sent,
    /// The delivery failed, with the failure rendering.
    Failed(String),
}

/// One journal entry: timestamp, outcome, recipient list.
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    timestamp: DateTime<Local>,
    outcome: DeliveryOutcome,
    recipients: Vec<String>,
}

impl DeliveryRecord {
    /// Creates a record stamped with the current local time.
    pub fn new(outcome: DeliveryOutcome, recipients: Vec<String>) -> Self {
        Self::at(Local::now(), outcome, recipients)
    }

    /// Creates a record with an explicit timestamp.
    pub fn at(
        timestamp: DateTime<Local>,
        outcome: DeliveryOutcome,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            timestamp,
            outcome,
            recipients,
        }
    }

    /// Returns the recorded outcome.
    pub fn outcome(&self) -> &DeliveryOutcome {
        &self.outcome
    }
}

impl fmt::Display for DeliveryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - ", self.timestamp.format(TIMESTAMP_FORMAT))?;
        match &self.outcome {
            DeliveryOutcome::Sent => write!(f, "Email sent")?,
            DeliveryOutcome::Failed(detail) => write!(f, "Email failed ({})", detail)?,
        }
        write!(f, " to {}", render_recipients(&self.recipients))
    }
}

fn render_recipients(recipients: &[String]) -> String {
    let quoted: Vec<String> = recipients.iter().map(|r| format!("'{}'", r)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Append-only delivery record sink.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Creates a journal writing to the given path. The file is created on
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the journal path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record as a single line.
    pub fn append(&self, record: &DeliveryRecord) -> MailResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                MailError::logging(format!("{}: {}", self.path.display(), e)).with_cause(e)
            })?;

        file.write_all(format!("{}\n", record).as_bytes())
            .map_err(|e| {
                MailError::logging(format!("{}: {}", self.path.display(), e)).with_cause(e)
            })
    }
}
