//! Mail client: composes the transport command and the delivery journal.
//!
//! `send()` is synchronous and makes at most one delivery attempt; callers
//! needing retry re-invoke it. A journal record is written for every attempt,
//! and a journal failure never overturns the send outcome.

use std::time::Instant;

use crate::config::MailConfig;
use crate::errors::MailResult;
use crate::journal::{DeliveryOutcome, DeliveryRecord, Journal};
use crate::transport::TransportCommand;
use crate::types::{Message, SendResult};

/// High-level delivery client.
#[derive(Debug, Clone)]
pub struct MailClient {
    /// External transport invocation.
    transport: TransportCommand,
    /// Optional delivery journal. Absence disables logging entirely.
    journal: Option<Journal>,
}

impl MailClient {
    /// Creates a client around a transport command, with no journal.
    pub fn new(transport: TransportCommand) -> Self {
        Self {
            transport,
            journal: None,
        }
    }

    /// Creates a builder for the client.
    pub fn builder() -> MailClientBuilder {
        MailClientBuilder::default()
    }

    /// Creates a client from a configuration.
    pub fn from_config(config: &MailConfig) -> Self {
        Self {
            transport: config.transport_command(),
            journal: config.journal.as_ref().map(Journal::new),
        }
    }

    /// Returns the transport command.
    pub fn transport(&self) -> &TransportCommand {
        &self.transport
    }

    /// Sends a built message.
    ///
    /// A [`Message`] only exists via a successful
    /// [`MessageBuilder::build`](crate::types::MessageBuilder::build), so the
    /// incomplete-message error always surfaces before any process is
    /// spawned. The call blocks until the transport exits, fails to spawn, or
    /// exceeds its deadline.
    pub fn send(&self, message: &Message) -> MailResult<SendResult> {
        let started = Instant::now();
        let recipients: Vec<String> = message
            .recipient_addresses()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mime_document = message.to_mime()?;

        tracing::info!(
            recipients = ?recipients,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "sending message via transport"
        );

        let recipient_refs: Vec<&str> = recipients.iter().map(String::as_str).collect();
        let outcome = self.transport.deliver(&recipient_refs, &mime_document);

        let record = match &outcome {
            Ok(()) => DeliveryRecord::new(DeliveryOutcome::Sent, recipients.clone()),
            Err(e) => DeliveryRecord::new(DeliveryOutcome::Failed(e.to_string()), recipients.clone()),
        };
        let log_error = self.journal.as_ref().and_then(|j| j.append(&record).err());
        if let Some(e) = &log_error {
            tracing::warn!(error = %e, "delivery record could not be written");
        }

        match outcome {
            Ok(()) => {
                tracing::info!(recipients = ?recipients, "message sent");
                Ok(SendResult {
                    recipients,
                    duration: started.elapsed(),
                    log_error,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "delivery failed");
                Err(e)
            }
        }
    }
}

/// Builder for [`MailClient`].
#[derive(Debug, Default)]
pub struct MailClientBuilder {
    transport: Option<TransportCommand>,
    journal: Option<Journal>,
}

impl MailClientBuilder {
    /// Sets the transport command.
    pub fn transport(mut self, transport: TransportCommand) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Enables the delivery journal at the given path.
    pub fn journal(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.journal = Some(Journal::new(path));
        self
    }

    /// Builds the client. The default transport applies when none was set.
    pub fn build(self) -> MailClient {
        MailClient {
            transport: self.transport.unwrap_or_default(),
            journal: self.journal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MailErrorKind;
    use std::time::Duration;

    fn sample_message() -> Message {
        let mut builder = Message::builder();
        builder.sender_name("Ops");
        builder.recipient("a@b.com").unwrap();
        builder.subject("Hi");
        builder.body("Hello", "plain").unwrap();
        builder.build().unwrap()
    }

    fn shell_client(script: &str) -> MailClient {
        MailClient::new(TransportCommand::new("/bin/sh").arg("-c").arg(script))
    }

    #[test]
    fn test_send_streams_mime_and_journals_success() {
        let dir = tempfile::tempdir().unwrap();
        let captured = dir.path().join("captured");
        let log = dir.path().join("send.log");

        let client = MailClient::builder()
            .transport(
                TransportCommand::new("/bin/sh")
                    .arg("-c")
                    .arg(format!("cat > {}", captured.display())),
            )
            .journal(&log)
            .build();

        let result = client.send(&sample_message()).unwrap();
        assert_eq!(result.recipients, vec!["a@b.com"]);
        assert!(!result.logging_failed());

        let document = std::fs::read_to_string(&captured).unwrap();
        assert!(document.contains("To: a@b.com"));
        assert!(document.contains("Subject: Hi"));

        let journal = std::fs::read_to_string(&log).unwrap();
        assert_eq!(journal.lines().count(), 1);
        assert!(journal.contains("Email sent to ['a@b.com']"));
    }

    #[test]
    fn test_failed_delivery_is_journaled_and_raised() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("send.log");

        let client = MailClient::builder()
            .transport(
                TransportCommand::new("/bin/sh")
                    .arg("-c")
                    .arg("echo 'authentication failed' >&2; exit 1"),
            )
            .journal(&log)
            .build();

        let err = client.send(&sample_message()).unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::DeliveryFailed);
        assert_eq!(err.exit_code(), Some(1));
        assert!(err.stderr().unwrap().contains("authentication failed"));

        let journal = std::fs::read_to_string(&log).unwrap();
        assert!(journal.contains("Email failed"));
        assert!(journal.contains("authentication failed"));
        assert!(journal.contains("['a@b.com']"));
    }

    #[test]
    fn test_spawn_failure_is_journaled_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("send.log");

        let client = MailClient::builder()
            .transport(TransportCommand::new("/no/such/transport"))
            .journal(&log)
            .build();

        let err = client.send(&sample_message()).unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::TransportUnavailable);

        let journal = std::fs::read_to_string(&log).unwrap();
        assert!(journal.contains("Email failed (Transport unavailable"));
    }

    #[test]
    fn test_journal_failure_does_not_mask_success() {
        let dir = tempfile::tempdir().unwrap();

        let client = MailClient::builder()
            .transport(TransportCommand::new("/bin/sh").arg("-c").arg("cat > /dev/null"))
            // A directory is not an appendable file.
            .journal(dir.path())
            .build();

        let result = client.send(&sample_message()).unwrap();
        assert!(result.logging_failed());
        assert_eq!(
            result.log_error.as_ref().unwrap().kind(),
            MailErrorKind::LoggingFailed
        );
    }

    #[test]
    fn test_no_journal_is_a_noop_not_an_error() {
        let client = shell_client("cat > /dev/null");
        let result = client.send(&sample_message()).unwrap();
        assert!(!result.logging_failed());
    }

    #[test]
    fn test_incomplete_builder_fails_before_any_spawn() {
        let mut builder = Message::builder();
        builder.recipient("a@b.com").unwrap();
        // No subject, no body: no Message can exist, so nothing is spawned.
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::IncompleteMessage);
    }

    #[test]
    fn test_from_config_wires_transport_and_journal() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("send.log");
        let config = MailConfig::builder()
            .program("/bin/sh")
            .arg("-c")
            .arg("cat > /dev/null")
            .timeout(Some(Duration::from_secs(5)))
            .journal(&log)
            .build()
            .unwrap();

        let client = MailClient::from_config(&config);
        client.send(&sample_message()).unwrap();

        let journal = std::fs::read_to_string(&log).unwrap();
        assert!(journal.contains("Email sent"));
    }
}
