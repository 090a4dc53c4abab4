//! Settings loaded from `config.toml` in the data directory. Every section
//! and field is optional; a missing file behaves like an empty one.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::db::DB_FILE_NAME;
use crate::reminder::{DEFAULT_SUBJECT, DEFAULT_TEMPLATE};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub mail: MailConfig,
    pub reminder: ReminderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Overrides `<data dir>/property_manager.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS, usually port 465.
    Tls,
    /// Plain connection upgraded with STARTTLS, usually port 587.
    #[default]
    Starttls,
    /// No encryption. Only sensible for a local relay.
    None,
}

#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    /// Sender mailbox. Falls back to the login username.
    pub from: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub subject: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            security: SmtpSecurity::default(),
            from: None,
            username: None,
            password: None,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

// Hand-written so the password never lands in a log line.
impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("from", &self.from)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("subject", &self.subject)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReminderConfig {
    pub template: String,
    /// Leases ending within this many days are highlighted.
    pub warning_days: i64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            warning_days: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Database location: the configured path or the default file inside
    /// `data_dir`.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| data_dir.join(DB_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.mail.subject, "Lease Expiration Reminder");
        assert_eq!(
            config.database_path(dir.path()),
            dir.path().join("property_manager.db")
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::parse(
            r#"
            [mail]
            host = "smtp.example.com"
            port = 465
            security = "tls"
            username = "pm@example.com"

            [reminder]
            warning_days = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.mail.host, "smtp.example.com");
        assert_eq!(config.mail.port, 465);
        assert_eq!(config.mail.security, SmtpSecurity::Tls);
        assert_eq!(config.mail.password, None);
        assert_eq!(config.reminder.warning_days, 30);
        assert_eq!(config.reminder.template, DEFAULT_TEMPLATE);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[mail\nport = 'x'").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn debug_output_hides_the_password() {
        let config = AppConfig::parse("[mail]\npassword = \"hunter2\"").unwrap();
        let rendered = format!("{:?}", config.mail);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
