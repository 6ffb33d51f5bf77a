//! Raw RFC 5322 bytes → [`ParsedMessage`].
//!
//! Headers come from [`header::parse_header_block`]; the part tree comes from
//! `mail-parser`, converted into the crate's own [`MimePart`] so body
//! extraction does not depend on the parser's types.

use mail_parser::{MessageParser, MimeHeaders, PartType};
use tracing::{debug, warn};

use crate::model::message::{MimePart, ParsedMessage, PartBody};
use crate::parser::header;

/// Maximum nesting of multiparts and embedded messages (guards adversarial input).
const MAX_DEPTH: usize = 10;

const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Parse a complete raw message. Never fails.
///
/// When `mail-parser` rejects the input, everything after the header block
/// becomes a single `text/plain` part.
pub fn parse_message(raw: &[u8]) -> ParsedMessage {
    let headers = header::parse_header_block(raw);

    let root = match MessageParser::default().parse(raw) {
        Some(msg) => convert_part(&msg, 0, 0),
        None => {
            warn!(bytes = raw.len(), "MIME parse failed, using raw body");
            fallback_root(raw)
        }
    };

    ParsedMessage { headers, root }
}

/// Build our node for `message.parts[part_id]` and everything below it.
fn convert_part(message: &mail_parser::Message<'_>, part_id: usize, depth: usize) -> MimePart {
    let Some(part) = message.parts.get(part_id) else {
        return MimePart::multipart("multipart/mixed", Vec::new());
    };

    let content_type = part
        .content_type()
        .map(|ct| match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        })
        .map(|ct| ct.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    let filename = part.attachment_name().map(String::from);

    let body = match &part.body {
        PartType::Text(text) | PartType::Html(text) => PartBody::Bytes(text.as_bytes().to_vec()),
        PartType::Binary(bytes) | PartType::InlineBinary(bytes) => PartBody::Bytes(bytes.to_vec()),
        PartType::Multipart(children) => {
            if depth >= MAX_DEPTH {
                debug!(depth, "Multipart nesting too deep, truncating");
                PartBody::Parts(Vec::new())
            } else {
                PartBody::Parts(
                    children
                        .iter()
                        .map(|&child| convert_part(message, child, depth + 1))
                        .collect(),
                )
            }
        }
        PartType::Message(nested) => {
            let nested: &mail_parser::Message<'_> = nested;
            if depth >= MAX_DEPTH {
                PartBody::Parts(Vec::new())
            } else {
                PartBody::Parts(vec![convert_part(nested, 0, depth + 1)])
            }
        }
    };

    MimePart {
        content_type,
        filename,
        body,
    }
}

/// Everything after the first blank line, as plain text.
fn fallback_root(raw: &[u8]) -> MimePart {
    let body = match header::find_header_end(raw) {
        Some(end) => {
            let rest = &raw[end..];
            let skip = rest.iter().take_while(|b| matches!(b, b'\r' | b'\n')).count();
            rest[skip..].to_vec()
        }
        None => Vec::new(),
    };
    MimePart::leaf(DEFAULT_CONTENT_TYPE, body)
}
