//! Sequential processing of a day's messages.

use chrono::NaiveDate;
use tracing::{info, warn};

use super::record::{build_record, Outcome};
use crate::mailbox::{Mailbox, SessionGuard};
use crate::model::record::{FormattedRecord, MessageId};

/// Progress callback: `(processed, total)`.
pub type Progress<'a> = &'a dyn Fn(usize, usize);

/// Build records for `ids` in order, dropping (and logging) skipped messages.
pub fn collect_records<M: Mailbox + ?Sized>(
    mailbox: &mut M,
    ids: &[MessageId],
    progress: Option<Progress<'_>>,
) -> Vec<FormattedRecord> {
    let total = ids.len();
    let mut records = Vec::with_capacity(total);
    let mut skipped = 0usize;

    for (i, &id) in ids.iter().enumerate() {
        let outcome = build_record(mailbox, id);
        if let Outcome::Skipped { id, reason } = &outcome {
            skipped += 1;
            warn!(%id, %reason, "Message excluded from digest");
        }
        records.extend(outcome.into_record());
        if let Some(cb) = progress {
            cb(i + 1, total);
        }
    }

    info!(kept = records.len(), skipped, "Processed messages");
    records
}

/// Run one ingest pass over an open mailbox and release it.
///
/// The mailbox is closed exactly once, whether the pass finishes or unwinds.
pub fn ingest<M: Mailbox>(
    mailbox: M,
    since: NaiveDate,
    progress: Option<Progress<'_>>,
) -> Vec<FormattedRecord> {
    let mut session = SessionGuard::new(mailbox);
    let ids = session.list_recent(since);
    if ids.is_empty() {
        info!(%since, "No messages since cutoff");
    }
    let records = collect_records(&mut *session, &ids, progress);
    session.close();
    records
}
