//! The per-day text file the summarization stage reads.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{DigestError, Result};
use crate::model::record::FormattedRecord;

/// Written after every record.
pub const RECORD_SEPARATOR: &str = "\n\n\n\n\n";

/// `{dir}/{date_key}.txt`
pub fn artifact_path(dir: &Path, date_key: &str) -> PathBuf {
    dir.join(format!("{date_key}.txt"))
}

/// Concatenate records, each followed by [`RECORD_SEPARATOR`].
pub fn render_artifact(records: &[FormattedRecord]) -> String {
    records
        .iter()
        .map(|record| format!("{record}{RECORD_SEPARATOR}"))
        .collect()
}

/// Write the day's records, creating `dir` if needed. An empty day still
/// produces an (empty) file.
pub fn write_artifact(dir: &Path, date_key: &str, records: &[FormattedRecord]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| DigestError::io(dir, e))?;
    let path = artifact_path(dir, date_key);
    std::fs::write(&path, render_artifact(records)).map_err(|e| DigestError::io(&path, e))?;
    info!(path = %path.display(), records = records.len(), "Saved daily records");
    Ok(path)
}

/// Read the day's records back. `Ok(None)` when the file does not exist.
pub fn read_artifact(dir: &Path, date_key: &str) -> Result<Option<String>> {
    let path = artifact_path(dir, date_key);
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DigestError::io(&path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subject: &str) -> FormattedRecord {
        FormattedRecord {
            sender: "a@b.com".into(),
            subject: subject.into(),
            timestamp: "Unknown".into(),
            body: String::new(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_render_separates_with_five_newlines() {
        let text = render_artifact(&[record("one"), record("two")]);
        assert_eq!(
            text,
            "From: a@b.com\nSubject: one\nDate: Unknown\n\n\n\n\n\n\n\
             From: a@b.com\nSubject: two\nDate: Unknown\n\n\n\n\n\n\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_artifact(&[]), "");
    }

    #[test]
    fn test_artifact_path() {
        assert_eq!(
            artifact_path(Path::new("emails"), "2024-01-04"),
            PathBuf::from("emails/2024-01-04.txt")
        );
    }
}
