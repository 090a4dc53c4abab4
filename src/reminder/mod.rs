//! Lease reminders: fill the template from the selected apartment and hand
//! the result to a mail transport.

mod mailer;
mod template;

use std::path::PathBuf;

use crate::error::LeaseError;
use crate::models::Apartment;

pub use mailer::{MailTransport, SenderCredentials, SmtpMailer};
pub use template::{render, DEFAULT_TEMPLATE, LEASE_END_TOKEN, LEASE_START_TOKEN, NAME_TOKEN};

pub const DEFAULT_SUBJECT: &str = "Lease Expiration Reminder";

/// A fully composed email for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

/// Build the reminder for the selected apartment. Refused when nothing (or a
/// building) is selected; the inputs are only borrowed, so a refusal leaves
/// the template and attachment list as they were.
pub fn compose(
    selection: Option<&Apartment>,
    template: &str,
    subject: &str,
    attachments: &[PathBuf],
) -> Result<Reminder, LeaseError> {
    let apartment = selection.ok_or(LeaseError::NoApartmentSelected)?;
    Ok(Reminder {
        to: apartment.email.clone(),
        subject: subject.to_string(),
        body: render(template, apartment),
        attachments: attachments.to_vec(),
    })
}

/// Deliver one reminder. No retry: the first transport error is returned.
pub fn send(
    transport: &dyn MailTransport,
    reminder: &Reminder,
    credentials: Option<&SenderCredentials>,
) -> Result<(), LeaseError> {
    let credentials = credentials.ok_or(LeaseError::MissingCredentials)?;
    if let Some(missing) = reminder.attachments.iter().find(|path| !path.is_file()) {
        return Err(LeaseError::AttachmentNotFound(missing.clone()));
    }

    match transport.deliver(reminder, credentials) {
        Ok(()) => {
            tracing::info!(
                to = %reminder.to,
                attachments = reminder.attachments.len(),
                "sent lease reminder"
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!(to = %reminder.to, error = %err, "failed to send lease reminder");
            Err(err)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;

    /// Transport double that records deliveries, or fails every send when
    /// built with `failing`.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub(crate) sent: RefCell<Vec<Reminder>>,
        pub(crate) failure: Option<String>,
    }

    impl RecordingTransport {
        pub(crate) fn failing(message: &str) -> Self {
            Self {
                sent: RefCell::default(),
                failure: Some(message.to_string()),
            }
        }
    }

    impl MailTransport for RecordingTransport {
        fn deliver(
            &self,
            reminder: &Reminder,
            _credentials: &SenderCredentials,
        ) -> Result<(), LeaseError> {
            if let Some(message) = &self.failure {
                return Err(LeaseError::Mail(message.clone()));
            }
            self.sent.borrow_mut().push(reminder.clone());
            Ok(())
        }
    }

    impl MailTransport for std::rc::Rc<RecordingTransport> {
        fn deliver(
            &self,
            reminder: &Reminder,
            credentials: &SenderCredentials,
        ) -> Result<(), LeaseError> {
            self.as_ref().deliver(reminder, credentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingTransport;
    use super::*;

    fn tenant() -> Apartment {
        Apartment {
            id: 1,
            number: "1A".into(),
            tenant: "J. Doe".into(),
            email: "j@x.com".into(),
            lease_start: "01/01/2024".into(),
            lease_end: "12/31/2024".into(),
        }
    }

    fn credentials() -> SenderCredentials {
        SenderCredentials::new("pm@example.com", "pw")
    }

    #[test]
    fn compose_fills_recipient_and_body() {
        let reminder = compose(
            Some(&tenant()),
            "{Name}, your lease ends {Lease End}.",
            DEFAULT_SUBJECT,
            &[],
        )
        .unwrap();
        assert_eq!(reminder.to, "j@x.com");
        assert_eq!(reminder.subject, "Lease Expiration Reminder");
        assert_eq!(reminder.body, "J. Doe, your lease ends 12/31/2024.");
    }

    #[test]
    fn compose_without_selection_is_refused() {
        let attachments = vec![PathBuf::from("/tmp/lease.pdf")];
        let template = "{Name} owes rent";
        let err = compose(None, template, DEFAULT_SUBJECT, &attachments).unwrap_err();
        assert_eq!(err, LeaseError::NoApartmentSelected);
        assert_eq!(attachments, vec![PathBuf::from("/tmp/lease.pdf")]);
        assert_eq!(template, "{Name} owes rent");
    }

    #[test]
    fn send_requires_credentials() {
        let transport = RecordingTransport::default();
        let reminder = compose(Some(&tenant()), "hi", DEFAULT_SUBJECT, &[]).unwrap();
        assert_eq!(
            send(&transport, &reminder, None),
            Err(LeaseError::MissingCredentials)
        );
        assert!(transport.sent.borrow().is_empty());
    }

    #[test]
    fn send_checks_attachments_before_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.pdf");
        let transport = RecordingTransport::default();
        let reminder =
            compose(Some(&tenant()), "hi", DEFAULT_SUBJECT, &[missing.clone()]).unwrap();
        assert_eq!(
            send(&transport, &reminder, Some(&credentials())),
            Err(LeaseError::AttachmentNotFound(missing))
        );
        assert!(transport.sent.borrow().is_empty());
    }

    #[test]
    fn send_delivers_once_and_surfaces_failures() {
        let transport = RecordingTransport::default();
        let reminder = compose(Some(&tenant()), "hi", DEFAULT_SUBJECT, &[]).unwrap();
        send(&transport, &reminder, Some(&credentials())).unwrap();
        assert_eq!(transport.sent.borrow().as_slice(), &[reminder.clone()]);

        let failing = RecordingTransport::failing("connection refused");
        let err = send(&failing, &reminder, Some(&credentials())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "An error occurred while sending the email: connection refused"
        );
    }
}
