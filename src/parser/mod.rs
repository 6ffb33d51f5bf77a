//! Email parsing: header decoding, MIME tree construction, and body extraction.

pub mod header;
pub mod message;
pub mod mime;
