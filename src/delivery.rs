//! Sending the finished digest by email.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info};

use crate::config::SmtpConfig;
use crate::credentials::MailCredentials;
use crate::error::{DigestError, Result};

/// Something that can deliver a plain-text email.
pub trait Delivery {
    fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()>;
}

/// SMTP over implicit TLS, authenticated with the mailbox credentials.
pub struct SmtpDelivery {
    transport: SmtpTransport,
    from: String,
}

impl SmtpDelivery {
    pub fn new(config: &SmtpConfig, credentials: &MailCredentials) -> Result<Self> {
        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| DigestError::Delivery(format!("SMTP relay '{}': {e}", config.host)))?
            .port(config.port)
            .credentials(Credentials::new(
                credentials.user.clone(),
                credentials.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: credentials.user.clone(),
        })
    }
}

impl Delivery for SmtpDelivery {
    fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| DigestError::Delivery(format!("invalid from address: {e}")))?,
            )
            .to(recipient
                .parse()
                .map_err(|e| DigestError::Delivery(format!("invalid recipient '{recipient}': {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DigestError::Delivery(format!("could not build message: {e}")))?;

        self.transport
            .send(&message)
            .map_err(|e| DigestError::Delivery(format!("SMTP send failed: {e}")))?;
        Ok(())
    }
}

/// Subject line of the digest for `date_key`.
pub fn digest_subject(date_key: &str) -> String {
    format!("Email Summary for {date_key}")
}

/// Send the digest; failures are logged and reported as `false`.
pub fn deliver_digest(delivery: &dyn Delivery, date_key: &str, summary: &str, recipient: &str) -> bool {
    match delivery.send(&digest_subject(date_key), summary, recipient) {
        Ok(()) => {
            info!(recipient, "Digest sent");
            true
        }
        Err(e) => {
            error!(recipient, error = %e, "Digest delivery failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Outbox {
        sent: RefCell<Vec<(String, String, String)>>,
        fail: bool,
    }

    impl Delivery for Outbox {
        fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()> {
            if self.fail {
                return Err(DigestError::Delivery("connection refused".into()));
            }
            self.sent
                .borrow_mut()
                .push((subject.into(), body.into(), recipient.into()));
            Ok(())
        }
    }

    #[test]
    fn test_deliver_uses_dated_subject() {
        let outbox = Outbox::default();
        assert!(deliver_digest(&outbox, "2024-01-04", "summary", "me@example.com"));
        let sent = outbox.sent.borrow();
        assert_eq!(sent[0].0, "Email Summary for 2024-01-04");
        assert_eq!(sent[0].2, "me@example.com");
    }

    #[test]
    fn test_delivery_failure_is_not_fatal() {
        let outbox = Outbox {
            fail: true,
            ..Outbox::default()
        };
        assert!(!deliver_digest(&outbox, "2024-01-04", "summary", "me@example.com"));
    }
}
