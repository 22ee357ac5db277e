// log.rs — Append-only JSONL content log.
//
// One JSON object per line, opened in append mode so existing history is
// never overwritten. Each entry's `previous_hash` must equal the hash of the
// preceding raw line; `verify_chain` walks the file and reports the first
// line where that link is broken.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::entry::ContentEntry;
use crate::error::HistoryError;
use crate::hasher;

/// An append-only content log backed by a JSONL file.
pub struct ContentLog {
    writer: BufWriter<File>,
    path: PathBuf,
    /// Hash of the last line written: the expected `previous_hash` of the next entry.
    last_hash: Option<String>,
}

impl ContentLog {
    /// Open (or create) a content log at the given path.
    ///
    /// Existing content is scanned to recover the chain head.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| HistoryError::OpenFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // The chain head is the hash of the last non-blank line on disk.
        let last_hash = if path.exists() {
            raw_lines(&path)?.last().map(|(_, line)| hasher::hash_str(line))
        } else {
            None
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| HistoryError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), resumed = last_hash.is_some(), "content log opened");

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            last_hash,
        })
    }

    /// Append an already-chained entry.
    ///
    /// The entry's `previous_hash` must match the log head; entries are
    /// chained by [`crate::ContentHistory::append`] before they get here.
    pub fn append(&mut self, entry: &ContentEntry) -> Result<(), HistoryError> {
        if entry.previous_hash != self.last_hash {
            return Err(HistoryError::OutOfOrder {
                entry_id: entry.entry_id.to_string(),
                expected: self
                    .last_hash
                    .clone()
                    .unwrap_or_else(|| "None".to_string()),
            });
        }

        let json = serde_json::to_string(entry)?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;
        self.last_hash = Some(hasher::hash_str(&json));
        Ok(())
    }

    /// Read all entries from a log file, oldest first. Blank lines are skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<ContentEntry>, HistoryError> {
        raw_lines(path.as_ref())?
            .iter()
            .map(|(_, line)| serde_json::from_str(line).map_err(HistoryError::from))
            .collect()
    }

    /// Verify the hash chain of a log file.
    ///
    /// Each link is checked against the hash of the raw preceding line, not
    /// a re-serialized entry, so a rewrite that only reorders fields still
    /// breaks the chain.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<bool, HistoryError> {
        let mut head: Option<String> = None;
        for (number, line) in raw_lines(path.as_ref())? {
            let entry: ContentEntry = serde_json::from_str(&line)?;
            if entry.previous_hash != head {
                return Err(HistoryError::IntegrityViolation {
                    line: number,
                    expected: head.unwrap_or_else(|| "None".to_string()),
                    actual: entry.previous_hash.unwrap_or_else(|| "None".to_string()),
                });
            }
            head = Some(hasher::hash_str(&line));
        }
        Ok(true)
    }

    /// Return the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Non-blank lines of a log file with their 1-based line numbers.
fn raw_lines(path: &Path) -> Result<Vec<(usize, String)>, HistoryError> {
    let file = File::open(path).map_err(|source| HistoryError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push((index + 1, line));
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryCause;
    use crate::history::ContentHistory;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn chained(history: &mut ContentHistory, revision: u64, content: &str) -> ContentEntry {
        history
            .append(ContentEntry::new(
                Uuid::new_v4(),
                None,
                "Chart.yaml",
                revision,
                Some(content.to_string()),
                EntryCause::Seeded,
            ))
            .unwrap()
            .clone()
    }

    #[test]
    fn append_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ws.history.jsonl");
        let mut history = ContentHistory::new();

        {
            let mut log = ContentLog::open(&path).unwrap();
            log.append(&chained(&mut history, 0, "a")).unwrap();
            log.append(&chained(&mut history, 1, "b")).unwrap();
        }

        let entries = ContentLog::read_all(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries, history.entries().cloned().collect::<Vec<_>>());
        assert!(ContentLog::verify_chain(&path).unwrap());
    }

    #[test]
    fn reopen_continues_chain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ws.history.jsonl");
        let mut history = ContentHistory::new();

        {
            let mut log = ContentLog::open(&path).unwrap();
            log.append(&chained(&mut history, 0, "a")).unwrap();
        }
        {
            let mut log = ContentLog::open(&path).unwrap();
            log.append(&chained(&mut history, 1, "b")).unwrap();
        }

        assert!(ContentLog::verify_chain(&path).unwrap());
    }

    #[test]
    fn unlinked_entry_is_rejected() {
        let dir = tempdir().unwrap();
        let mut log = ContentLog::open(dir.path().join("ws.history.jsonl")).unwrap();
        let mut history = ContentHistory::new();
        chained(&mut history, 0, "skipped");
        let second = chained(&mut history, 1, "b");

        let err = log.append(&second).unwrap_err();
        assert!(matches!(err, HistoryError::OutOfOrder { .. }));
    }

    #[test]
    fn tampered_log_fails_verification() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ws.history.jsonl");
        let mut history = ContentHistory::new();
        {
            let mut log = ContentLog::open(&path).unwrap();
            log.append(&chained(&mut history, 0, "a")).unwrap();
            log.append(&chained(&mut history, 1, "b")).unwrap();
            log.append(&chained(&mut history, 2, "c")).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let mut lines: Vec<&str> = content.lines().collect();
        lines.remove(1);
        fs::write(&path, lines.join("\n") + "\n").unwrap();

        let err = ContentLog::verify_chain(&path).unwrap_err();
        assert!(matches!(err, HistoryError::IntegrityViolation { line: 2, .. }));
    }

    #[test]
    fn blank_lines_are_skipped_but_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ws.history.jsonl");
        let mut history = ContentHistory::new();
        {
            let mut log = ContentLog::open(&path).unwrap();
            log.append(&chained(&mut history, 0, "a")).unwrap();
        }
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("\n\n");
        fs::write(&path, content).unwrap();

        // The head is still the last real entry, so the chain continues.
        {
            let mut log = ContentLog::open(&path).unwrap();
            log.append(&chained(&mut history, 1, "b")).unwrap();
        }
        assert_eq!(ContentLog::read_all(&path).unwrap().len(), 2);
        assert!(ContentLog::verify_chain(&path).unwrap());

        // Violations report the physical line, blanks included.
        let mut rogue = ContentHistory::new();
        let unlinked = serde_json::to_string(&chained(&mut rogue, 2, "c")).unwrap();
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str(&unlinked);
        content.push('\n');
        fs::write(&path, content).unwrap();
        let err = ContentLog::verify_chain(&path).unwrap_err();
        assert!(matches!(err, HistoryError::IntegrityViolation { line: 5, .. }));
    }

    #[test]
    fn read_all_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = ContentLog::read_all(dir.path().join("missing.jsonl")).unwrap_err();
        assert!(matches!(err, HistoryError::OpenFailed { .. }));
    }
}
