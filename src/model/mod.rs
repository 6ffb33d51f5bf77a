//! Core data model types: parsed messages, identifiers, and formatted records.

pub mod message;
pub mod record;
