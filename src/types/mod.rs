//! Core types for the mail pipeline.
//!
//! This module provides:
//! - Address types with validation
//! - Body and attachment handling
//! - The message builder and the immutable built message
//! - Send result types

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{MailError, MailResult};
use crate::recipients;

/// Email address with optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Display name (e.g., "John Doe").
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com").
    pub email: String,
}

impl Address {
    /// Creates a new address from a bare email.
    pub fn new(email: impl Into<String>) -> MailResult<Self> {
        let email = email.into();
        Self::validate_email(&email)?;
        Ok(Self { name: None, email })
    }

    /// Creates a new address with display name and email.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> MailResult<Self> {
        let email = email.into();
        Self::validate_email(&email)?;
        Ok(Self {
            name: Some(name.into()),
            email,
        })
    }

    /// Parses an address from a string (e.g., "John Doe <john@example.com>").
    pub fn parse(s: &str) -> MailResult<Self> {
        let s = s.trim();

        // Check for "Name <email>" format
        if let Some(start) = s.find('<') {
            if let Some(end) = s.find('>') {
                let name = s[..start].trim().trim_matches('"');
                let email = s[start + 1..end].trim();
                return Self::with_name(name, email);
            }
        }

        Self::new(s)
    }

    /// Validates the structural shape of an email address (local-part@domain).
    fn validate_email(email: &str) -> MailResult<()> {
        let fail = |reason: &str| Err(MailError::invalid_recipient(email, reason));

        if email.is_empty() {
            return fail("address is empty");
        }

        if email.len() > 254 {
            return fail("address too long (max 254 characters)");
        }

        let at_count = email.chars().filter(|c| *c == '@').count();
        if at_count != 1 {
            return fail("address must contain exactly one @");
        }

        let (local, domain) = email.split_once('@').unwrap_or(("", ""));

        if local.is_empty() || local.len() > 64 {
            return fail("local part must be 1-64 characters");
        }

        if domain.is_empty() {
            return fail("domain is empty");
        }

        if email.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return fail("address contains control or whitespace characters");
        }

        Ok(())
    }

    /// Returns the email part only.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name if present.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Formats the address for email headers.
    pub fn to_header(&self) -> String {
        match &self.name {
            Some(name) => {
                // Quote the name if it contains special characters
                if name.contains(|c: char| !c.is_alphanumeric() && c != ' ') {
                    format!("\"{}\" <{}>", name, self.email)
                } else {
                    format!("{} <{}>", name, self.email)
                }
            }
            None => self.email.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_header())
    }
}

impl TryFrom<&str> for Address {
    type Error = MailError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = MailError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Address::parse(&s)
    }
}

/// Content subtype of the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Plain text body.
    #[default]
    Plain,
    /// HTML body.
    Html,
}

impl BodyKind {
    /// Parses a subtype tag. Only `plain` and `html` are accepted.
    pub fn parse(subtype: &str) -> MailResult<Self> {
        match subtype {
            "plain" => Ok(BodyKind::Plain),
            "html" => Ok(BodyKind::Html),
            other => Err(MailError::unsupported_body_type(other)),
        }
    }

    /// Returns the Content-Type header value for this subtype.
    pub fn mime_type(&self) -> &'static str {
        match self {
            BodyKind::Plain => "text/plain; charset=utf-8",
            BodyKind::Html => "text/html; charset=utf-8",
        }
    }
}

/// Message body: text content plus its subtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    /// Body text.
    pub text: String,
    /// Content subtype.
    pub kind: BodyKind,
}

/// File attachment, read fully into memory at attach time.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Filename presented in the message.
    pub filename: String,
    /// MIME content type.
    pub content_type: mime::Mime,
    /// Binary content.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from in-memory bytes, inferring the content type
    /// from the filename extension (`application/octet-stream` when unknown).
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename).first_or_octet_stream();
        Self {
            filename,
            content_type,
            data,
        }
    }

    /// Reads a file fully into memory and wraps it as an attachment.
    pub fn read(path: impl AsRef<Path>) -> MailResult<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                MailError::attachment(format!("{}: no usable file name", path.display()))
            })?
            .to_string();

        let data = std::fs::read(path).map_err(|e| {
            MailError::attachment(format!("{}: {}", path.display(), e)).with_cause(e)
        })?;

        Ok(Self::from_bytes(filename, data))
    }
}

/// An immutable, sendable email message.
///
/// Produced only by [`MessageBuilder::build`], so every `Message` satisfies
/// the sendability invariants: at least one recipient, a non-empty subject,
/// and a body.
#[derive(Debug, Clone)]
pub struct Message {
    /// Display-name portion of the From header. The underlying sender address
    /// belongs to the external transport's account configuration and cannot be
    /// set through this crate.
    pub sender_name: Option<String>,
    /// Recipients in first-insertion order, duplicates collapsed.
    pub recipients: Vec<Address>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: Body,
    /// Attachments in attach order.
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Creates a new message builder.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Returns the recipient address strings in header order.
    pub fn recipient_addresses(&self) -> Vec<&str> {
        self.recipients.iter().map(|a| a.email()).collect()
    }

    /// Returns true if the message has any attachments.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Serializes the message as a MIME document.
    ///
    /// The output is deterministic: identical messages serialize to identical
    /// bytes.
    pub fn to_mime(&self) -> MailResult<Vec<u8>> {
        crate::mime::encode(self)
    }
}

/// Builder for [`Message`].
///
/// Methods take `&mut self` so a failed call leaves the builder usable: the
/// caller can fix the offending input and continue. Note that a failed
/// [`recipients_from_file`](Self::recipients_from_file) keeps the entries
/// loaded before the failure.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    sender_name: Option<String>,
    recipients: Vec<Address>,
    subject: String,
    body: Option<Body>,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender display name used in the From header.
    ///
    /// Only the human-readable portion is affected; the sender address itself
    /// is supplied by the external transport's configuration.
    pub fn sender_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.sender_name = Some(name.into());
        self
    }

    /// Adds a recipient after validating its structural shape.
    ///
    /// Duplicate addresses are collapsed; the first insertion wins and order
    /// is preserved.
    pub fn recipient(&mut self, address: &str) -> MailResult<&mut Self> {
        let address = Address::parse(address)?;
        if !self.recipients.iter().any(|r| r.email == address.email) {
            self.recipients.push(address);
        }
        Ok(self)
    }

    /// Loads recipients from a file.
    ///
    /// Accepted layouts: a JSON object with a `recipients` array, a bare JSON
    /// array of address strings, or plain text with one address per line
    /// (blank lines ignored). Every loaded address goes through the same
    /// validation as [`recipient`](Self::recipient); the first invalid entry
    /// aborts the load and previously-loaded recipients remain in place.
    pub fn recipients_from_file(&mut self, path: impl AsRef<Path>) -> MailResult<&mut Self> {
        for address in recipients::load(path.as_ref())? {
            self.recipient(&address)?;
        }
        Ok(self)
    }

    /// Sets the subject line.
    pub fn subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = subject.into();
        self
    }

    /// Sets the body text and its subtype (`plain` or `html`).
    ///
    /// A message carries exactly one body; calling this again replaces it.
    pub fn body(&mut self, text: impl Into<String>, subtype: &str) -> MailResult<&mut Self> {
        let kind = BodyKind::parse(subtype)?;
        self.body = Some(Body {
            text: text.into(),
            kind,
        });
        Ok(self)
    }

    /// Reads a file fully into memory and attaches it.
    ///
    /// The MIME type is inferred from the file extension.
    pub fn attach(&mut self, path: impl AsRef<Path>) -> MailResult<&mut Self> {
        self.attachments.push(Attachment::read(path)?);
        Ok(self)
    }

    /// Returns the recipients accumulated so far.
    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    /// Validates the sendability invariants and produces the message.
    ///
    /// The builder is left untouched, so a failed build can be fixed up and
    /// retried.
    pub fn build(&self) -> MailResult<Message> {
        let mut missing = Vec::new();
        if self.recipients.is_empty() {
            missing.push("recipients");
        }
        if self.subject.is_empty() {
            missing.push("subject");
        }
        if self.body.is_none() {
            missing.push("body");
        }
        if !missing.is_empty() {
            return Err(MailError::incomplete(&missing));
        }
        let body = self
            .body
            .clone()
            .ok_or_else(|| MailError::incomplete(&["body"]))?;

        Ok(Message {
            sender_name: self.sender_name.clone(),
            recipients: self.recipients.clone(),
            subject: self.subject.clone(),
            body,
            attachments: self.attachments.clone(),
        })
    }
}

/// Result of a successful send.
#[derive(Debug)]
pub struct SendResult {
    /// Addresses the transport was invoked with.
    pub recipients: Vec<String>,
    /// Wall-clock duration of the delivery attempt.
    pub duration: Duration,
    /// Journal-write failure, if one occurred. A failed journal write never
    /// overturns the send outcome; it is carried here for inspection.
    pub log_error: Option<MailError>,
}

impl SendResult {
    /// Returns true if the delivery record could not be written.
    pub fn logging_failed(&self) -> bool {
        self.log_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MailErrorKind;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case("test@example.com")]
    #[case("test.name@sub.example.com")]
    #[case("a+tag@x.co")]
    fn valid_addresses_accepted(#[case] addr: &str) {
        assert!(Address::new(addr).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("no-at-sign")]
    #[case("two@@signs.com")]
    #[case("@no-local.com")]
    #[case("no-domain@")]
    #[case("sp ace@example.com")]
    fn invalid_addresses_rejected(#[case] addr: &str) {
        let err = Address::new(addr).unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::InvalidRecipient);
    }

    #[test]
    fn test_address_parse_display_name() {
        let addr = Address::parse("John Doe <john@example.com>").unwrap();
        assert_eq!(addr.email, "john@example.com");
        assert_eq!(addr.name, Some("John Doe".to_string()));

        let addr = Address::parse("\"John, Doe\" <john@example.com>").unwrap();
        assert_eq!(addr.name, Some("John, Doe".to_string()));
    }

    #[test]
    fn test_recipient_dedup_preserves_order() {
        let mut builder = Message::builder();
        builder
            .recipient("a@x.com")
            .unwrap()
            .recipient("b@y.com")
            .unwrap()
            .recipient("a@x.com")
            .unwrap();

        let emails: Vec<_> = builder.recipients().iter().map(|a| a.email()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@y.com"]);
    }

    #[test]
    fn test_invalid_recipient_leaves_set_unchanged() {
        let mut builder = Message::builder();
        builder.recipient("a@x.com").unwrap();

        let err = builder.recipient("broken").unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::InvalidRecipient);
        assert_eq!(builder.recipients().len(), 1);
    }

    #[test]
    fn test_body_subtype_constraint() {
        let mut builder = Message::builder();
        assert!(builder.body("hi", "plain").is_ok());
        assert!(builder.body("<p>hi</p>", "html").is_ok());

        let err = builder.body("hi", "markdown").unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::UnsupportedBodyType);
        assert!(err.to_string().contains("markdown"));
    }

    #[test]
    fn test_build_names_every_missing_field() {
        let err = Message::builder().build().unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::IncompleteMessage);
        let text = err.to_string();
        assert!(text.contains("recipients"));
        assert!(text.contains("subject"));
        assert!(text.contains("body"));
    }

    #[test]
    fn test_build_succeeds_after_fixing_missing_field() {
        let mut builder = Message::builder();
        builder.recipient("a@b.com").unwrap();
        builder.body("Hello", "plain").unwrap();

        let err = builder.build().unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::IncompleteMessage);
        assert!(err.to_string().contains("subject"));

        builder.subject("Hi");
        let message = builder.build().unwrap();
        assert_eq!(message.subject, "Hi");
        assert_eq!(message.recipient_addresses(), vec!["a@b.com"]);
    }

    #[test]
    fn test_recipient_file_layouts_yield_identical_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let files = [
            ("object.json", r#"{"recipients": ["a@x.com", "b@y.com"]}"#),
            ("array.json", r#"["a@x.com", "b@y.com"]"#),
            ("plain.txt", "a@x.com\n\nb@y.com\n"),
        ];

        let mut sequences = Vec::new();
        for (name, content) in files {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();

            let mut builder = Message::builder();
            builder.recipients_from_file(&path).unwrap();
            builder.subject("Hi");
            builder.body("Hello", "plain").unwrap();
            let message = builder.build().unwrap();
            let emails: Vec<String> = message
                .recipient_addresses()
                .into_iter()
                .map(str::to_string)
                .collect();
            sequences.push(emails);
        }
        assert_eq!(sequences[0], sequences[1]);
        assert_eq!(sequences[1], sequences[2]);
    }

    #[test]
    fn test_recipient_file_partial_application_on_invalid_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.txt");
        std::fs::write(&path, "a@x.com\nb@y.com\nbroken\nc@z.com\n").unwrap();

        let mut builder = Message::builder();
        let err = builder.recipients_from_file(&path).unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::InvalidRecipient);
        assert!(err.to_string().contains("broken"));

        // Entries loaded before the failure remain; the load is not rolled
        // back.
        let emails: Vec<_> = builder.recipients().iter().map(|a| a.email()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@y.com"]);
    }

    #[test]
    fn test_attachment_type_inference() {
        let attachment = Attachment::from_bytes("report.pdf", vec![1, 2, 3]);
        assert_eq!(attachment.content_type.essence_str(), "application/pdf");

        let attachment = Attachment::from_bytes("blob.xyzzy", vec![1]);
        assert_eq!(
            attachment.content_type.essence_str(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_attach_reads_file_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"contents").unwrap();
        drop(file);

        let mut builder = Message::builder();
        builder.attach(&path).unwrap();

        // The message owns the bytes; removing the file no longer matters.
        std::fs::remove_file(&path).unwrap();
        builder
            .recipient("a@b.com")
            .unwrap()
            .subject("Hi")
            .body("see attached", "plain")
            .unwrap();
        let message = builder.build().unwrap();
        assert_eq!(message.attachments[0].data, b"contents");
        assert_eq!(message.attachments[0].filename, "note.txt");
    }

    #[test]
    fn test_attach_missing_file() {
        let mut builder = Message::builder();
        let err = builder.attach("/no/such/file.bin").unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::AttachmentRead);
    }
}
