//! Report Delivery Example
//!
//! This example demonstrates how to:
//! - Load recipients from a file (JSON object, JSON array, or plain text)
//! - Build a plain-text message with a sender display name
//! - Send it through the configured transport and journal the outcome
//!
//! Usage: send_report <recipients-file>

use mailpipe::{MailClient, MailError, Message, TransportCommand};

fn main() -> Result<(), MailError> {
    tracing_subscriber::fmt::init();

    let recipients_file = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: send_report <recipients-file>");
            std::process::exit(2);
        }
    };

    let mut builder = Message::builder();
    builder.sender_name("Ops Reports");
    builder.subject("Daily report");
    builder.body("Hello,\nHere is the daily report.\nRegards.", "plain")?;
    builder.recipients_from_file(&recipients_file)?;
    let message = builder.build()?;

    println!("Sending report...");
    println!("  To: {}", message.recipient_addresses().join(", "));
    println!("  Subject: {}", message.subject);

    let client = MailClient::builder()
        .transport(TransportCommand::new("/usr/bin/msmtp"))
        .journal("/tmp/mailpipe.log")
        .build();

    match client.send(&message) {
        Ok(result) => {
            println!("Report sent to {} recipient(s) in {:?}", result.recipients.len(), result.duration);
            if result.logging_failed() {
                eprintln!("warning: delivery record was not written");
            }
        }
        Err(e) => {
            eprintln!("Failed to send report: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
