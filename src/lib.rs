//! # mailpipe
//!
//! Email composition and delivery through an external sendmail-style
//! transport command (msmtp by default), with:
//! - A validating message builder (recipients, subject, plain/HTML body,
//!   attachments)
//! - Recipient lists loaded from JSON or plain-text files
//! - Deterministic MIME serialization
//! - Subprocess delivery with exit-status inspection, stderr capture, and a
//!   configurable deadline
//! - An append-only delivery journal
//!
//! The transport's account configuration — sender address, credentials,
//! TLS — is entirely outside this crate: the message carries at most a
//! sender *display name*, and the transport supplies the identity.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mailpipe::{MailClient, Message, TransportCommand};
//!
//! fn main() -> Result<(), mailpipe::MailError> {
//!     let mut builder = Message::builder();
//!     builder.sender_name("Home Server Monitoring");
//!     builder.recipient("ops@example.com")?;
//!     builder.subject("Disk usage report");
//!     builder.body("All volumes below 80%.", "plain")?;
//!     let message = builder.build()?;
//!
//!     let client = MailClient::builder()
//!         .transport(TransportCommand::new("/usr/bin/msmtp").account("gmail"))
//!         .journal("/var/log/mailpipe.log")
//!         .build();
//!
//!     let result = client.send(&message)?;
//!     println!("sent to {:?} in {:?}", result.recipients, result.duration);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod types;

// Recipient-file parsing
pub mod recipients;

// MIME serialization
pub mod mime;

// Delivery
pub mod transport;

// Delivery journal
pub mod journal;

// Client
pub mod client;

// Re-exports for convenience
pub use client::{MailClient, MailClientBuilder};
pub use config::{MailConfig, MailConfigBuilder};
pub use errors::{MailError, MailErrorKind, MailResult};
pub use journal::{DeliveryOutcome, DeliveryRecord, Journal};
pub use transport::{TransportCommand, DEFAULT_PROGRAM, DEFAULT_TIMEOUT};
pub use types::{
    Address, Attachment, Body, BodyKind, Message, MessageBuilder, SendResult,
};
