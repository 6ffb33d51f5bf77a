//! IMAP-over-TLS implementation of [`Mailbox`].

use std::net::TcpStream;

use chrono::NaiveDate;
use native_tls::{TlsConnector, TlsStream};
use tracing::{debug, info, warn};

use super::Mailbox;
use crate::config::ImapConfig;
use crate::credentials::MailCredentials;
use crate::error::{DigestError, Result};
use crate::model::record::{MessageId, RawMessage};

type TlsSession = ::imap::Session<TlsStream<TcpStream>>;

/// IMAP `SINCE` criteria use `DD-Mon-YYYY`.
const SINCE_FORMAT: &str = "%d-%b-%Y";

/// A logged-in IMAP session with one folder selected.
pub struct ImapMailbox {
    session: TlsSession,
    host: String,
}

impl ImapMailbox {
    /// Connect over TLS, log in, and select the configured folder.
    ///
    /// Transport and TLS failures are [`DigestError::Connection`]; a refused
    /// login is [`DigestError::Authentication`]; a refused SELECT is
    /// [`DigestError::Mailbox`] (the session is logged out first).
    pub fn connect(config: &ImapConfig, credentials: &MailCredentials) -> Result<Self> {
        let host = config.host.as_str();
        let connection_error = |reason: String| DigestError::Connection {
            host: format!("{host}:{}", config.port),
            reason,
        };

        let tls = TlsConnector::builder()
            .build()
            .map_err(|e| connection_error(format!("TLS setup: {e}")))?;
        let client = ::imap::connect((host, config.port), host, &tls)
            .map_err(|e| connection_error(e.to_string()))?;

        let mut session = client
            .login(&credentials.user, &credentials.password)
            .map_err(|(e, _client)| DigestError::Authentication {
                user: credentials.user.clone(),
                reason: e.to_string(),
            })?;

        if let Err(e) = session.select(&config.folder) {
            if let Err(logout_err) = session.logout() {
                warn!(host, error = %logout_err, "IMAP logout after failed SELECT failed");
            }
            return Err(DigestError::Mailbox(format!(
                "SELECT {}: {e}",
                config.folder
            )));
        }

        info!(host, folder = %config.folder, user = %credentials.user, "IMAP session open");
        Ok(Self {
            session,
            host: host.to_string(),
        })
    }
}

/// `SINCE "16-Jul-2025"`
pub fn since_query(since: NaiveDate) -> String {
    format!("SINCE \"{}\"", since.format(SINCE_FORMAT))
}

impl Mailbox for ImapMailbox {
    fn list_recent(&mut self, since: NaiveDate) -> Vec<MessageId> {
        let query = since_query(since);
        match self.session.search(&query) {
            Ok(found) => {
                // SEARCH answers with a set; sequence numbers sort back into mailbox order.
                let mut ids: Vec<MessageId> = found.into_iter().map(MessageId).collect();
                ids.sort_unstable();
                info!(count = ids.len(), %query, "Found recent messages");
                ids
            }
            Err(e) => {
                warn!(%query, error = %e, "Search failed, continuing with no messages");
                Vec::new()
            }
        }
    }

    fn fetch_raw(&mut self, id: MessageId) -> Option<RawMessage> {
        let fetches = match self.session.fetch(id.to_string(), "RFC822") {
            Ok(fetches) => fetches,
            Err(e) => {
                warn!(%id, error = %e, "Fetch failed");
                return None;
            }
        };

        let raw = fetches.iter().find_map(|fetch| fetch.body()).map(<[u8]>::to_vec);
        match &raw {
            Some(bytes) => debug!(%id, bytes = bytes.len(), "Fetched message"),
            None => warn!(%id, "Fetch response carried no message body"),
        }
        raw
    }

    fn close(&mut self) {
        match self.session.logout() {
            Ok(()) => debug!(host = %self.host, "IMAP session closed"),
            Err(e) => warn!(host = %self.host, error = %e, "IMAP logout failed"),
        }
    }
}
