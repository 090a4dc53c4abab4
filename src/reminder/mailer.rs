use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::{MailConfig, SmtpSecurity};
use crate::error::LeaseError;

use super::Reminder;

/// Account used to authenticate against the mail server.
#[derive(Clone, PartialEq, Eq)]
pub struct SenderCredentials {
    pub username: String,
    pub secret: String,
}

impl SenderCredentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Credentials fully supplied by the config file, if any.
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        match (&config.username, &config.password) {
            (Some(username), Some(password)) if !username.trim().is_empty() => {
                Some(Self::new(username.trim(), password.clone()))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for SenderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderCredentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Anything that can hand a composed reminder to a mail server.
pub trait MailTransport {
    fn deliver(&self, reminder: &Reminder, credentials: &SenderCredentials)
        -> Result<(), LeaseError>;
}

/// Submits reminders over SMTP. A new connection is opened per send.
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn sender<'a>(&'a self, credentials: &'a SenderCredentials) -> &'a str {
        self.config
            .from
            .as_deref()
            .filter(|from| !from.trim().is_empty())
            .unwrap_or(&credentials.username)
    }

    fn transport(&self, credentials: &SenderCredentials) -> Result<SmtpTransport, LeaseError> {
        let host = self.config.host.as_str();
        let builder = match self.config.security {
            SmtpSecurity::Tls => SmtpTransport::relay(host),
            SmtpSecurity::Starttls => SmtpTransport::starttls_relay(host),
            SmtpSecurity::None => Ok(SmtpTransport::builder_dangerous(host)),
        }
        .map_err(|err| LeaseError::Mail(err.to_string()))?;

        Ok(builder
            .port(self.config.port)
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.secret.clone(),
            ))
            .build())
    }
}

impl MailTransport for SmtpMailer {
    fn deliver(
        &self,
        reminder: &Reminder,
        credentials: &SenderCredentials,
    ) -> Result<(), LeaseError> {
        let message = build_message(reminder, self.sender(credentials))?;
        let transport = self.transport(credentials)?;
        tracing::debug!(host = %self.config.host, port = self.config.port, "submitting reminder");
        transport
            .send(&message)
            .map_err(|err| LeaseError::Mail(err.to_string()))?;
        Ok(())
    }
}

/// Assemble the MIME message: a plain-text body followed by one part per
/// attachment, read from disk now.
pub(crate) fn build_message(reminder: &Reminder, from: &str) -> Result<Message, LeaseError> {
    let from = from
        .parse::<Mailbox>()
        .map_err(|err| LeaseError::Mail(format!("invalid sender address '{from}': {err}")))?;
    let to = reminder.to.parse::<Mailbox>().map_err(|err| {
        LeaseError::Mail(format!("invalid recipient address '{}': {err}", reminder.to))
    })?;

    let mut body = MultiPart::mixed().singlepart(SinglePart::plain(reminder.body.clone()));
    for path in &reminder.attachments {
        body = body.singlepart(attachment_part(path)?);
    }

    Message::builder()
        .from(from)
        .to(to)
        .subject(reminder.subject.clone())
        .multipart(body)
        .map_err(|err| LeaseError::Mail(err.to_string()))
}

fn attachment_part(path: &Path) -> Result<SinglePart, LeaseError> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => LeaseError::AttachmentNotFound(path.to_path_buf()),
        _ => LeaseError::Mail(format!("failed to read {}: {err}", path.display())),
    })?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let content_type =
        ContentType::parse(mime.essence_str()).map_err(|err| LeaseError::Mail(err.to_string()))?;

    Ok(Attachment::new(filename).body(bytes, content_type))
}
