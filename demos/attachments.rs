//! Attachment Example
//!
//! This example demonstrates how to:
//! - Attach files to a message (MIME type inferred from the extension)
//! - Send an HTML body alongside the attachments
//!
//! Usage: attachments <recipient> <file>...

use mailpipe::{MailClient, MailError, Message, TransportCommand};

fn main() -> Result<(), MailError> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let recipient = match args.next() {
        Some(addr) => addr,
        None => {
            eprintln!("usage: attachments <recipient> <file>...");
            std::process::exit(2);
        }
    };

    let html_body = r#"<html>
<body>
<h1>Monthly report</h1>
<p>The report and supporting data are attached.</p>
</body>
</html>"#;

    let mut builder = Message::builder();
    builder.sender_name("Analytics Team");
    builder.recipient(&recipient)?;
    builder.subject("Monthly report");
    builder.body(html_body, "html")?;

    for path in args {
        builder.attach(&path)?;
        println!("Attached {}", path);
    }
    let message = builder.build().map_err(|e| {
        eprintln!("Message is not sendable: {}", e);
        e
    })?;

    let client = MailClient::new(TransportCommand::new("/usr/bin/msmtp"));
    let result = client.send(&message)?;
    println!("Sent to {:?} in {:?}", result.recipients, result.duration);

    Ok(())
}
