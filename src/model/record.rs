//! Per-message identifiers and the records the digest is built from.

use serde::Serialize;

/// Server-assigned message sequence number.
///
/// Only meaningful inside the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u32);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte-exact wire form of one message.
pub type RawMessage = Vec<u8>;

/// Plain-text body plus attachment names, in part-tree order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedBody {
    pub text: String,
    pub attachments: Vec<String>,
}

/// Final rendering of one message, as written to the daily artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedRecord {
    pub sender: String,
    pub subject: String,
    /// `%Y-%m-%d %H:%M:%S` or `"Unknown"`.
    pub timestamp: String,
    /// Cleaned body, only readable lines.
    pub body: String,
    pub attachments: Vec<String>,
}

impl std::fmt::Display for FormattedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "From: {}\nSubject: {}\nDate: {}\n\n{}",
            self.sender, self.subject, self.timestamp, self.body
        )?;
        if !self.attachments.is_empty() {
            write!(f, "\n\nAttachments:\n{}", self.attachments.join("\n"))?;
        }
        Ok(())
    }
}
