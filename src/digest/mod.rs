//! The ingest pipeline: per-message records, the batch loop, and the daily artifact.

pub mod artifact;
pub mod batch;
pub mod record;

pub use artifact::{read_artifact, write_artifact};
pub use batch::{collect_records, ingest};
pub use record::{build_record, render_record, Outcome, SkipReason};

use chrono::{Duration, Local, NaiveDate};

/// The calendar day a run covers: today minus `lookback_days`.
pub fn cutoff_date(lookback_days: u32) -> NaiveDate {
    Local::now().date_naive() - Duration::days(i64::from(lookback_days))
}

/// Key naming the day's artifacts, e.g. `2024-01-04` for `%Y-%m-%d`.
pub fn date_key(date: NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}
