//! MIME serialization of built messages.
//!
//! Produces an RFC 5322 document with:
//! - Fixed header order: From, To, Subject, MIME-Version, Content-Type
//! - Header folding and RFC 2047 encoding of non-ASCII header values
//! - Quoted-printable body encoding
//! - Base64 attachment parts in attach order
//!
//! Serialization is deterministic: identical messages produce identical
//! bytes. The multipart boundary is derived from a digest of the part
//! contents instead of a clock or RNG.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::{Digest, Md5};

use crate::errors::MailResult;
use crate::types::{Attachment, Message};

/// Base64 transfer-encoding line width.
const BASE64_LINE_WIDTH: usize = 76;

/// Serializes a message to a MIME document.
pub fn encode(message: &Message) -> MailResult<Vec<u8>> {
    let mut output = Vec::new();

    // The sender address belongs to the transport's account configuration.
    // Group syntax (RFC 6854) carries the display name without asserting an
    // address; with no display name the From header is left to the transport.
    if let Some(name) = &message.sender_name {
        write_header(&mut output, "From", &format!("{}:;", format_phrase(name)));
    }

    let to: Vec<String> = message.recipients.iter().map(|a| a.to_header()).collect();
    write_header(&mut output, "To", &to.join(", "));
    write_header(&mut output, "Subject", &encode_header(&message.subject));
    write_header(&mut output, "MIME-Version", "1.0");

    if message.has_attachments() {
        let boundary = boundary(message);
        write_header(
            &mut output,
            "Content-Type",
            &format!("multipart/mixed; boundary=\"{}\"", boundary),
        );
        output.extend_from_slice(b"\r\n");

        output.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        write_body_part(&mut output, message);

        for attachment in &message.attachments {
            output.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            write_attachment(&mut output, attachment);
        }

        output.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    } else {
        write_body_part(&mut output, message);
    }

    Ok(output)
}

/// Writes the body as its own part: Content-Type and transfer-encoding
/// headers, a blank line, then the quoted-printable text.
fn write_body_part(output: &mut Vec<u8>, message: &Message) {
    write_header(output, "Content-Type", message.body.kind.mime_type());
    write_header(output, "Content-Transfer-Encoding", "quoted-printable");
    output.extend_from_slice(b"\r\n");
    output.extend_from_slice(&quoted_printable::encode(message.body.text.as_bytes()));
    output.extend_from_slice(b"\r\n");
}

fn write_attachment(output: &mut Vec<u8>, attachment: &Attachment) {
    write_header(
        output,
        "Content-Type",
        &format!("{}; name=\"{}\"", attachment.content_type, attachment.filename),
    );
    write_header(output, "Content-Transfer-Encoding", "base64");
    write_header(
        output,
        "Content-Disposition",
        &format!("attachment; filename=\"{}\"", attachment.filename),
    );
    output.extend_from_slice(b"\r\n");

    let encoded = BASE64.encode(&attachment.data);
    for chunk in encoded.as_bytes().chunks(BASE64_LINE_WIDTH) {
        output.extend_from_slice(chunk);
        output.extend_from_slice(b"\r\n");
    }
}

fn write_header(output: &mut Vec<u8>, name: &str, value: &str) {
    let folded = fold_header(&format!("{}: {}", name, value));
    output.extend_from_slice(folded.as_bytes());
    output.extend_from_slice(b"\r\n");
}

/// Folds a header line at 78 characters, continuation lines indented by one
/// space.
fn fold_header(header: &str) -> String {
    if header.len() <= 78 {
        return header.to_string();
    }

    let mut result = String::new();
    let mut current_line = String::new();

    for word in header.split(' ') {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= 76 {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            result.push_str(&current_line);
            result.push_str("\r\n ");
            current_line = word.to_string();
        }
    }

    result.push_str(&current_line);
    result
}

/// Encodes a header value using RFC 2047 when it is not printable ASCII.
fn encode_header(value: &str) -> String {
    if value.chars().all(|c| c.is_ascii() && !c.is_control()) {
        return value.to_string();
    }

    format!("=?UTF-8?B?{}?=", BASE64.encode(value.as_bytes()))
}

/// Renders a display name as an RFC 5322 phrase: quoted when it contains
/// specials, RFC 2047 encoded when it is not ASCII.
fn format_phrase(name: &str) -> String {
    if !name.chars().all(|c| c.is_ascii() && !c.is_control()) {
        return encode_header(name);
    }
    if name.contains(|c: char| !c.is_alphanumeric() && c != ' ') {
        return format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""));
    }
    name.to_string()
}

/// Derives the multipart boundary from the part contents, so repeated builds
/// of the same message serialize identically.
fn boundary(message: &Message) -> String {
    let mut hasher = Md5::new();
    hasher.update(message.body.text.as_bytes());
    for attachment in &message.attachments {
        hasher.update(attachment.filename.as_bytes());
        hasher.update(&attachment.data);
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("=_{}", hex)
}
