//! Body extraction: walk the MIME tree, pick the text body, list attachments.

use crate::model::message::{MimePart, ParsedMessage, PartBody};
use crate::model::record::ExtractedBody;
use crate::text::html_to_text;

/// Produce the plain-text body and attachment names of a message.
///
/// Walks the part tree depth-first:
/// - a part with a non-empty filename is an attachment (any content type)
///   and never becomes the body
/// - the LAST `text/plain` leaf is the body
/// - failing that, the LAST `text/html` leaf, converted with links dropped
/// - anything else is ignored
///
/// Never fails; a message with nothing usable yields an empty body.
pub fn extract_body(message: &ParsedMessage) -> ExtractedBody {
    let mut walk = Walk::default();
    walk.visit(&message.root);

    let text = match (walk.plain, walk.html) {
        (Some(plain), _) => String::from_utf8_lossy(plain).into_owned(),
        (None, Some(html)) => html_to_text(&String::from_utf8_lossy(html)),
        (None, None) => String::new(),
    };

    ExtractedBody {
        text,
        attachments: walk.attachments,
    }
}

#[derive(Default)]
struct Walk<'a> {
    plain: Option<&'a [u8]>,
    html: Option<&'a [u8]>,
    attachments: Vec<String>,
}

impl<'a> Walk<'a> {
    fn visit(&mut self, part: &'a MimePart) {
        // A named part is an attachment as a whole, including forwarded messages.
        if let Some(name) = part.attachment_name() {
            self.attachments.push(name.to_string());
            return;
        }
        match &part.body {
            PartBody::Parts(children) => {
                for child in children {
                    self.visit(child);
                }
            }
            PartBody::Bytes(bytes) => {
                match part.content_type.as_str() {
                    "text/plain" => self.plain = Some(bytes.as_slice()),
                    "text/html" => self.html = Some(bytes.as_slice()),
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::Headers;

    fn message(root: MimePart) -> ParsedMessage {
        ParsedMessage {
            headers: Headers::default(),
            root,
        }
    }

    #[test]
    fn test_single_plain() {
        let body = extract_body(&message(MimePart::leaf("text/plain", "Just text")));
        assert_eq!(body.text, "Just text");
        assert!(body.attachments.is_empty());
    }

    #[test]
    fn test_single_html_has_no_tags() {
        let html = "<html><body><p>Dinner is <b>at eight</b>.</p>\
                    <a href=\"https://x.example\">Directions</a></body></html>";
        let body = extract_body(&message(MimePart::leaf("text/html", html)));
        assert!(!body.text.is_empty());
        assert!(!body.text.contains('<'));
        assert!(!body.text.contains("x.example"));
        assert!(body.text.contains("Dinner is at eight."));
    }

    #[test]
    fn test_plain_plus_attachment() {
        let root = MimePart::multipart(
            "multipart/mixed",
            vec![
                MimePart::leaf("text/plain", "Minutes attached."),
                MimePart::leaf("application/pdf", b"%PDF".to_vec()).with_filename("minutes.pdf"),
            ],
        );
        let body = extract_body(&message(root));
        assert_eq!(body.text, "Minutes attached.");
        assert_eq!(body.attachments, vec!["minutes.pdf".to_string()]);
    }

    #[test]
    fn test_plain_preferred_over_html() {
        let root = MimePart::multipart(
            "multipart/alternative",
            vec![
                MimePart::leaf("text/plain", "plain version"),
                MimePart::leaf("text/html", "<p>html version</p>"),
            ],
        );
        assert_eq!(extract_body(&message(root)).text, "plain version");
    }

    #[test]
    fn test_last_plain_part_wins() {
        let root = MimePart::multipart(
            "multipart/mixed",
            vec![
                MimePart::leaf("text/plain", "first"),
                MimePart::multipart(
                    "multipart/alternative",
                    vec![MimePart::leaf("text/plain", "second")],
                ),
                MimePart::leaf("text/plain", "third"),
            ],
        );
        assert_eq!(extract_body(&message(root)).text, "third");
    }

    #[test]
    fn test_text_attachment_is_not_body() {
        let root = MimePart::multipart(
            "multipart/mixed",
            vec![
                MimePart::leaf("text/plain", "the real body"),
                MimePart::leaf("text/plain", "log contents").with_filename("server.log"),
            ],
        );
        let body = extract_body(&message(root));
        assert_eq!(body.text, "the real body");
        assert_eq!(body.attachments, vec!["server.log".to_string()]);
    }

    #[test]
    fn test_attachment_order_follows_tree() {
        let root = MimePart::multipart(
            "multipart/mixed",
            vec![
                MimePart::leaf("image/png", vec![0u8]).with_filename("a.png"),
                MimePart::multipart(
                    "multipart/mixed",
                    vec![MimePart::leaf("application/zip", vec![0u8]).with_filename("b.zip")],
                ),
                MimePart::leaf("text/csv", vec![0u8]).with_filename("c.csv"),
            ],
        );
        let body = extract_body(&message(root));
        assert_eq!(body.attachments, vec!["a.png", "b.zip", "c.csv"]);
        assert_eq!(body.text, "");
    }

    #[test]
    fn test_unnamed_non_text_parts_ignored() {
        let root = MimePart::multipart(
            "multipart/related",
            vec![
                MimePart::leaf("image/gif", vec![1u8, 2, 3]),
                MimePart::leaf("text/calendar", "BEGIN:VCALENDAR"),
            ],
        );
        let body = extract_body(&message(root));
        assert_eq!(body, ExtractedBody::default());
    }

    #[test]
    fn test_named_forwarded_message_is_attachment() {
        let forwarded = MimePart::multipart(
            "message/rfc822",
            vec![MimePart::leaf("text/plain", "old thread")],
        )
        .with_filename("fwd.eml");
        let root = MimePart::multipart(
            "multipart/mixed",
            vec![MimePart::leaf("text/plain", "see below"), forwarded],
        );
        let body = extract_body(&message(root));
        assert_eq!(body.text, "see below");
        assert_eq!(body.attachments, vec!["fwd.eml"]);
    }

    #[test]
    fn test_invalid_utf8_is_substituted() {
        let body = extract_body(&message(MimePart::leaf("text/plain", vec![b'o', b'k', 0xFF])));
        assert_eq!(body.text, "ok\u{FFFD}");
    }
}
