//! Configuration for the mail client.
//!
//! Everything here describes how to *invoke* the transport and where to
//! journal outcomes. The transport's own account configuration (sender
//! identity, credentials, TLS) lives outside this crate entirely.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{MailError, MailResult};
use crate::transport::{TransportCommand, DEFAULT_PROGRAM, DEFAULT_TIMEOUT};

/// Client configuration.
///
/// Deserializable from JSON, with every field optional:
///
/// ```json
/// {
///     "program": "/usr/bin/msmtp",
///     "account": "gmail",
///     "timeout": "90s",
///     "journal": "/var/log/mailpipe.log"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Transport program path.
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Extra arguments placed before the recipient addresses.
    #[serde(default)]
    pub args: Vec<String>,
    /// msmtp-style account selector, passed as `-a <account>`.
    #[serde(default)]
    pub account: Option<String>,
    /// Delivery deadline; `null` waits without bound.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Journal path; absence disables delivery logging.
    #[serde(default)]
    pub journal: Option<PathBuf>,
}

fn default_program() -> PathBuf {
    PathBuf::from(DEFAULT_PROGRAM)
}

fn default_timeout() -> Option<Duration> {
    Some(DEFAULT_TIMEOUT)
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            account: None,
            timeout: default_timeout(),
            journal: None,
        }
    }
}

impl MailConfig {
    /// Creates a new config builder.
    pub fn builder() -> MailConfigBuilder {
        MailConfigBuilder::default()
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> MailResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MailError::configuration(format!("{}: {}", path.display(), e)).with_cause(e)
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            MailError::configuration(format!("{}: {}", path.display(), e)).with_cause(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> MailResult<()> {
        if self.program.as_os_str().is_empty() {
            return Err(MailError::configuration("transport program is empty"));
        }
        Ok(())
    }

    /// Builds the transport command this configuration describes.
    pub fn transport_command(&self) -> TransportCommand {
        let mut command = TransportCommand::new(&self.program)
            .args(self.args.iter().cloned())
            .timeout(self.timeout);
        if let Some(account) = &self.account {
            command = command.account(account);
        }
        command
    }
}

/// Builder for [`MailConfig`].
#[derive(Debug, Default)]
pub struct MailConfigBuilder {
    config: MailConfig,
}

impl MailConfigBuilder {
    /// Sets the transport program path.
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.program = program.into();
        self
    }

    /// Appends an argument placed before the recipient addresses.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.config.args.push(arg.into());
        self
    }

    /// Sets the msmtp-style account selector.
    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.config.account = Some(account.into());
        self
    }

    /// Sets the delivery deadline.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the journal path.
    pub fn journal(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.journal = Some(path.into());
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> MailResult<MailConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MailErrorKind;

    #[test]
    fn test_defaults_apply_to_empty_document() {
        let config: MailConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.program, PathBuf::from(DEFAULT_PROGRAM));
        assert!(config.args.is_empty());
        assert_eq!(config.account, None);
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT));
        assert_eq!(config.journal, None);
    }

    #[test]
    fn test_humantime_timeout() {
        let config: MailConfig = serde_json::from_str(r#"{"timeout": "90s"}"#).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));

        let config: MailConfig = serde_json::from_str(r#"{"timeout": null}"#).unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_empty_program_rejected() {
        let err = MailConfig::builder().program("").build().unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::ConfigurationInvalid);
    }

    #[test]
    fn test_account_becomes_transport_flag() {
        let config = MailConfig::builder()
            .program("/usr/bin/msmtp")
            .account("work")
            .build()
            .unwrap();

        let command = config.transport_command();
        assert_eq!(command.arguments(), ["-a", "work"]);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mailpipe.json");
        std::fs::write(
            &path,
            r#"{"program": "/usr/sbin/sendmail", "args": ["-i"], "journal": "/tmp/send.log"}"#,
        )
        .unwrap();

        let config = MailConfig::from_file(&path).unwrap();
        assert_eq!(config.program, PathBuf::from("/usr/sbin/sendmail"));
        assert_eq!(config.args, ["-i"]);
        assert_eq!(config.journal, Some(PathBuf::from("/tmp/send.log")));
    }

    #[test]
    fn test_from_file_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();

        let err = MailConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), MailErrorKind::ConfigurationInvalid);
    }
}
