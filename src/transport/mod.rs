//! External transport invocation.
//!
//! The transport is a sendmail-style program (msmtp by default): it receives
//! the recipient addresses as positional arguments and the serialized MIME
//! document on stdin. Account selection, credentials, and TLS are entirely
//! the transport's own configuration; this module only spawns it, streams the
//! document, and inspects the exit status.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::errors::{MailError, MailErrorKind, MailResult};

/// Default transport program.
pub const DEFAULT_PROGRAM: &str = "/usr/bin/msmtp";

/// Default deadline for one delivery attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Poll interval while waiting on the child under a deadline.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// An invocable external transport command.
#[derive(Debug, Clone)]
pub struct TransportCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl TransportCommand {
    /// Creates a transport command for the given program, with the default
    /// deadline and no extra arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Appends one argument placed before the recipient addresses.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends arguments placed before the recipient addresses.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Selects an msmtp-style account (`-a <account>`).
    pub fn account(self, account: impl AsRef<str>) -> Self {
        self.arg("-a").arg(account.as_ref())
    }

    /// Sets the delivery deadline. `None` waits on the transport without
    /// bound.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the transport program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Returns the arguments placed before the recipient addresses.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Delivers one document: spawns the transport with the recipients as
    /// positional arguments, streams the document to stdin, and waits for
    /// completion.
    ///
    /// Exit 0 is success. A non-zero exit yields `DeliveryFailed` with the
    /// exit code and captured stderr; a spawn failure yields
    /// `TransportUnavailable`; exceeding the deadline kills the child and
    /// yields `TransportTimeout`.
    pub fn deliver(&self, recipients: &[&str], mime_document: &[u8]) -> MailResult<()> {
        tracing::debug!(
            program = %self.program.display(),
            recipients = recipients.len(),
            bytes = mime_document.len(),
            "invoking transport"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(recipients)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                MailError::transport_unavailable(format!("{}: {}", self.program.display(), e))
                    .with_cause(e)
            })?;

        self.stream_stdin(&mut child, mime_document)?;

        let status = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit)?,
            None => child.wait().map_err(|e| {
                MailError::new(MailErrorKind::DeliveryFailed, "failed waiting on transport")
                    .with_cause(e)
            })?,
        };

        let stderr_text = read_stderr(&mut child);

        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) => Err(MailError::delivery_failed(code, stderr_text)),
            None => Err(
                MailError::new(MailErrorKind::DeliveryFailed, "transport terminated by signal")
                    .with_stderr(stderr_text),
            ),
        }
    }

    /// Streams the document and closes stdin so the transport sees EOF.
    ///
    /// A broken pipe is tolerated here: a transport that exits before
    /// consuming its input reports the real failure through its exit status.
    fn stream_stdin(&self, child: &mut Child, mime_document: &[u8]) -> MailResult<()> {
        let Some(mut stdin) = child.stdin.take() else {
            return Ok(());
        };
        if let Err(e) = stdin.write_all(mime_document) {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MailError::new(
                    MailErrorKind::DeliveryFailed,
                    "failed streaming message to transport",
                )
                .with_cause(e));
            }
        }
        Ok(())
    }
}

impl Default for TransportCommand {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> MailResult<ExitStatus> {
    let deadline = Instant::now() + limit;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(MailError::timeout(format!(
                        "transport did not exit within {}s",
                        limit.as_secs_f64()
                    )));
                }
                std::thread::sleep(WAIT_POLL_INTERVAL);
            }
            Err(e) => {
                return Err(MailError::new(
                    MailErrorKind::DeliveryFailed,
                    "failed waiting on transport",
                )
                .with_cause(e))
            }
        }
    }
}

fn read_stderr(child: &mut Child) -> String {
    let mut text = String::new();
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_string(&mut text);
    }
    text
}
