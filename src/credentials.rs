//! Mail credentials and the environment variables secrets come from.
//!
//! The CLI reads these variables through clap's `env` support; this module
//! validates what it found.

use crate::error::{DigestError, Result};

/// Environment variable holding the mailbox login.
pub const USER_VAR: &str = "MAIL_USER";
/// Environment variable holding the mailbox password (or app password).
pub const PASSWORD_VAR: &str = "MAIL_PASSWORD";
/// Environment variable holding the summarization API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable holding the digest recipient.
pub const RECIPIENT_VAR: &str = "RECIPIENT_EMAIL";

/// Login used for both IMAP and SMTP.
#[derive(Clone)]
pub struct MailCredentials {
    pub user: String,
    pub password: String,
}

impl MailCredentials {
    /// Pair up an optional user and password. `None` unless both are non-empty.
    pub fn from_parts(user: Option<String>, password: Option<String>) -> Option<Self> {
        match (user, password) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some(Self { user, password })
            }
            _ => None,
        }
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Load mail credentials, failing the run when they are absent.
pub fn load_credentials(
    user: Option<String>,
    password: Option<String>,
) -> Result<MailCredentials> {
    MailCredentials::from_parts(user, password).ok_or_else(|| {
        tracing::error!("Mail credentials not found in environment");
        DigestError::Credentials(format!("{USER_VAR} and {PASSWORD_VAR}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_both() {
        assert!(MailCredentials::from_parts(Some("me".into()), None).is_none());
        assert!(MailCredentials::from_parts(None, Some("pw".into())).is_none());
        assert!(MailCredentials::from_parts(Some(String::new()), Some("pw".into())).is_none());
        let creds = MailCredentials::from_parts(Some("me".into()), Some("pw".into()))
            .expect("both present");
        assert_eq!(creds.user, "me");
    }

    #[test]
    fn test_load_credentials_missing_is_fatal() {
        let err = load_credentials(None, None).unwrap_err();
        assert!(matches!(err, DigestError::Credentials(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = MailCredentials {
            user: "me@example.com".into(),
            password: "hunter2".into(),
        };
        let shown = format!("{creds:?}");
        assert!(shown.contains("me@example.com"));
        assert!(!shown.contains("hunter2"));
    }
}
