//! `maildigest`: a daily digest of your inbox.
//!
//! This crate fetches the previous day's messages over IMAP, decodes their
//! MIME structure, keeps only human-readable prose, writes one text artifact
//! per day, and hands that artifact to a language model for summarization.

pub mod config;
pub mod credentials;
pub mod delivery;
pub mod digest;
pub mod error;
pub mod mailbox;
pub mod model;
pub mod parser;
pub mod summary;
pub mod text;
