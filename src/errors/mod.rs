//! Error types for the mail pipeline.
//!
//! Provides a single error struct with a kind taxonomy so callers can branch
//! on "bad recipient" vs "transport missing" vs "transport rejected the
//! message" without string matching.

use std::fmt;
use thiserror::Error;

/// Result type for mail operations.
pub type MailResult<T> = Result<T, MailError>;

/// Mail error kinds categorizing different failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailErrorKind {
    // Builder errors
    /// Recipient address is structurally invalid.
    InvalidRecipient,
    /// Recipient file could not be read or parsed.
    RecipientFile,
    /// Body subtype is not one of `plain` / `html`.
    UnsupportedBodyType,
    /// Attachment could not be read.
    AttachmentRead,
    /// Message is missing required fields.
    IncompleteMessage,

    // Delivery errors
    /// Transport program could not be spawned.
    TransportUnavailable,
    /// Transport ran but reported failure.
    DeliveryFailed,
    /// Transport exceeded the configured deadline.
    TransportTimeout,

    // Side channels
    /// Delivery journal could not be written.
    LoggingFailed,

    // Configuration errors
    /// Configuration is invalid.
    ConfigurationInvalid,
}

impl MailErrorKind {
    /// Returns true if this kind is raised while building a message,
    /// before any delivery attempt.
    pub fn is_build_time(&self) -> bool {
        matches!(
            self,
            MailErrorKind::InvalidRecipient
                | MailErrorKind::RecipientFile
                | MailErrorKind::UnsupportedBodyType
                | MailErrorKind::AttachmentRead
                | MailErrorKind::IncompleteMessage
        )
    }

    /// Returns true if this kind is raised by a delivery attempt.
    pub fn is_delivery(&self) -> bool {
        matches!(
            self,
            MailErrorKind::TransportUnavailable
                | MailErrorKind::DeliveryFailed
                | MailErrorKind::TransportTimeout
        )
    }
}

impl fmt::Display for MailErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailErrorKind::InvalidRecipient => write!(f, "Invalid recipient address"),
            MailErrorKind::RecipientFile => write!(f, "Recipient file error"),
            MailErrorKind::UnsupportedBodyType => write!(f, "Unsupported body type"),
            MailErrorKind::AttachmentRead => write!(f, "Attachment read error"),
            MailErrorKind::IncompleteMessage => write!(f, "Incomplete message"),
            MailErrorKind::TransportUnavailable => write!(f, "Transport unavailable"),
            MailErrorKind::DeliveryFailed => write!(f, "Delivery failed"),
            MailErrorKind::TransportTimeout => write!(f, "Transport timed out"),
            MailErrorKind::LoggingFailed => write!(f, "Delivery log write failed"),
            MailErrorKind::ConfigurationInvalid => write!(f, "Invalid configuration"),
        }
    }
}

/// Mail error with detailed information.
#[derive(Error, Debug)]
pub struct MailError {
    /// Error kind.
    kind: MailErrorKind,
    /// Human-readable message.
    message: String,
    /// Transport exit code if the process ran to completion.
    exit_code: Option<i32>,
    /// Diagnostic text the transport wrote to its error stream.
    stderr: Option<String>,
    /// Underlying cause.
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MailError {
    /// Creates a new mail error.
    pub fn new(kind: MailErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            exit_code: None,
            stderr: None,
            cause: None,
        }
    }

    /// Sets the transport exit code.
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Sets the captured error-stream text.
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause<E: std::error::Error + Send + Sync + 'static>(mut self, cause: E) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> MailErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the transport exit code if available.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Returns the captured error-stream text if available.
    pub fn stderr(&self) -> Option<&str> {
        self.stderr.as_deref()
    }

    // Convenience constructors

    /// Creates an invalid-recipient error naming the offending string.
    pub fn invalid_recipient(address: impl AsRef<str>, reason: impl fmt::Display) -> Self {
        Self::new(
            MailErrorKind::InvalidRecipient,
            format!("{:?}: {}", address.as_ref(), reason),
        )
    }

    /// Creates a recipient-file error.
    pub fn recipient_file(message: impl Into<String>) -> Self {
        Self::new(MailErrorKind::RecipientFile, message)
    }

    /// Creates an unsupported-body-type error naming the rejected subtype.
    pub fn unsupported_body_type(subtype: impl AsRef<str>) -> Self {
        Self::new(
            MailErrorKind::UnsupportedBodyType,
            format!("{:?} (expected \"plain\" or \"html\")", subtype.as_ref()),
        )
    }

    /// Creates an attachment-read error.
    pub fn attachment(message: impl Into<String>) -> Self {
        Self::new(MailErrorKind::AttachmentRead, message)
    }

    /// Creates an incomplete-message error naming the missing fields.
    pub fn incomplete(missing: &[&str]) -> Self {
        Self::new(
            MailErrorKind::IncompleteMessage,
            format!("missing {}", missing.join(", ")),
        )
    }

    /// Creates a transport-unavailable error.
    pub fn transport_unavailable(message: impl Into<String>) -> Self {
        Self::new(MailErrorKind::TransportUnavailable, message)
    }

    /// Creates a delivery-failed error from the transport's exit status.
    pub fn delivery_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        let message = if stderr.trim().is_empty() {
            format!("transport exited with status {}", exit_code)
        } else {
            stderr.trim().to_string()
        };
        Self::new(MailErrorKind::DeliveryFailed, message)
            .with_exit_code(exit_code)
            .with_stderr(stderr)
    }

    /// Creates a transport-timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(MailErrorKind::TransportTimeout, message)
    }

    /// Creates a journal-write error.
    pub fn logging(message: impl Into<String>) -> Self {
        Self::new(MailErrorKind::LoggingFailed, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(MailErrorKind::ConfigurationInvalid, message)
    }
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(code) = self.exit_code {
            write!(f, " (exit {})", code)?;
        }
        Ok(())
    }
}
