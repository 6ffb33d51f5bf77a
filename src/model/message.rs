//! Structured view of one raw message: header map and MIME part tree.

/// Header fields in wire order, names lowercased.
///
/// Folded continuation lines are already joined. Lookups are
/// case-insensitive and return the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Build from `(name, value)` pairs; names are lowercased.
    pub fn new(fields: Vec<(String, String)>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self { fields }
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Payload of a MIME node.
#[derive(Debug, Clone, PartialEq)]
pub enum PartBody {
    /// Transfer-decoded content. Text parts are already charset-decoded to UTF-8.
    Bytes(Vec<u8>),
    /// Children of a `multipart/*` container or an embedded `message/rfc822`.
    Parts(Vec<MimePart>),
}

/// One node of the MIME tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MimePart {
    /// Lowercase `type/subtype`; `text/plain` when the header is absent.
    pub content_type: String,
    /// `filename` from Content-Disposition or `name` from Content-Type.
    pub filename: Option<String>,
    pub body: PartBody,
}

impl MimePart {
    /// A leaf node.
    pub fn leaf(content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            filename: None,
            body: PartBody::Bytes(bytes.into()),
        }
    }

    /// A container node.
    pub fn multipart(content_type: impl Into<String>, parts: Vec<MimePart>) -> Self {
        Self {
            content_type: content_type.into(),
            filename: None,
            body: PartBody::Parts(parts),
        }
    }

    /// Attach a filename (builder style).
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// The filename, if present and not blank.
    pub fn attachment_name(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// A raw message split into headers and part tree. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    pub headers: Headers,
    pub root: MimePart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let headers = Headers::new(vec![
            ("Subject".into(), "Hello".into()),
            ("FROM".into(), "a@b.com".into()),
        ]);
        assert_eq!(headers.get("subject"), Some("Hello"));
        assert_eq!(headers.get("From"), Some("a@b.com"));
        assert_eq!(headers.get("date"), None);
    }

    #[test]
    fn test_header_first_occurrence_wins() {
        let headers = Headers::new(vec![
            ("received".into(), "first".into()),
            ("Received".into(), "second".into()),
        ]);
        assert_eq!(headers.get("received"), Some("first"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_blank_filename_is_not_an_attachment() {
        let part = MimePart::leaf("application/pdf", b"%PDF".to_vec()).with_filename("  ");
        assert_eq!(part.attachment_name(), None);
        let part = MimePart::leaf("application/pdf", b"%PDF".to_vec()).with_filename("a.pdf");
        assert_eq!(part.attachment_name(), Some("a.pdf"));
    }
}
