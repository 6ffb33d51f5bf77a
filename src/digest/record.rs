//! One message → one [`FormattedRecord`], or a logged reason it was skipped.

use tracing::{debug, warn};

use crate::mailbox::Mailbox;
use crate::model::record::{FormattedRecord, MessageId};
use crate::parser::header::{decode_encoded_words, format_timestamp};
use crate::parser::message::parse_message;
use crate::parser::mime::extract_body;
use crate::text::clean;

/// Why a message produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The server returned no bytes for the message.
    FetchFailed,
    /// The message was empty or only whitespace.
    Empty,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchFailed => write!(f, "fetch failed"),
            Self::Empty => write!(f, "empty message"),
        }
    }
}

/// Result of processing one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Record(FormattedRecord),
    Skipped { id: MessageId, reason: SkipReason },
}

impl Outcome {
    /// The record, if one was produced.
    pub fn into_record(self) -> Option<FormattedRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Skipped { .. } => None,
        }
    }
}

/// Fetch message `id` and format it.
pub fn build_record<M: Mailbox + ?Sized>(mailbox: &mut M, id: MessageId) -> Outcome {
    let Some(raw) = mailbox.fetch_raw(id) else {
        warn!(%id, "Skipping message: could not fetch");
        return Outcome::Skipped {
            id,
            reason: SkipReason::FetchFailed,
        };
    };

    match render_record(&raw) {
        Some(record) => {
            debug!(%id, subject = %record.subject, "Formatted message");
            Outcome::Record(record)
        }
        None => {
            warn!(%id, "Skipping message: empty");
            Outcome::Skipped {
                id,
                reason: SkipReason::Empty,
            }
        }
    }
}

/// Format raw message bytes. `None` only for empty input.
///
/// Missing Subject/From render as empty strings, an unparseable Date as
/// `"Unknown"`. Deterministic for identical input.
pub fn render_record(raw: &[u8]) -> Option<FormattedRecord> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let message = parse_message(raw);
    let header = |name: &str| {
        message
            .headers
            .get(name)
            .map(decode_encoded_words)
            .unwrap_or_default()
    };

    let body = extract_body(&message);

    Some(FormattedRecord {
        sender: header("from"),
        subject: header("subject"),
        timestamp: format_timestamp(message.headers.get("date")),
        body: clean(&body.text),
        attachments: body.attachments,
    })
}
