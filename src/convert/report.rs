// Conversion report
// Append-only JSONL log of every song outcome in a batch

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const REPORT_FILE: &str = "conversion.jsonl";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongOutcome {
    Converted,
    Skipped,
    Failed,
}

/// One song (or whole source, when it failed before any song was known)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// RFC 3339 timestamp of when this entry was created
    pub timestamp: String,

    /// Container file or song folder the song came from
    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,

    pub outcome: SongOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReportEntry {
    pub fn new(source: &Path, song: Option<String>, outcome: SongOutcome) -> Self {
        ReportEntry {
            timestamp: Utc::now().to_rfc3339(),
            source: source.display().to_string(),
            song,
            outcome,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Manages the append-only report file
pub struct ReportWriter {
    file_path: PathBuf,
}

impl ReportWriter {
    pub fn new(file_path: PathBuf) -> Self {
        ReportWriter { file_path }
    }

    /// Report file inside an output directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(REPORT_FILE))
    }

    /// Append an entry. Creates the file if it doesn't exist.
    pub fn write(&self, entry: &ReportEntry) -> Result<(), ReportError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        file.write_all(entry.to_json_line()?.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Read report entries from a JSONL file
pub fn read_report_file(path: &Path) -> Result<Vec<ReportEntry>, ReportError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        entries.push(serde_json::from_str(line)?);
    }

    Ok(entries)
}

/// Song counts of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The batch stopped before every source was visited
    pub aborted: bool,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: SongOutcome) {
        match outcome {
            SongOutcome::Converted => self.converted += 1,
            SongOutcome::Skipped => self.skipped += 1,
            SongOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.converted + self.skipped + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entry_json_line() {
        let entry = ReportEntry::new(
            Path::new("/dlc/song_p.psarc"),
            Some("Artist - Song".to_string()),
            SongOutcome::Failed,
        )
        .with_message("chord 9 is not in the chord table");

        let line = entry.to_json_line().unwrap();
        assert!(line.ends_with('\n'));

        let parsed: ReportEntry = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed.outcome, SongOutcome::Failed);
        assert_eq!(parsed.source, "/dlc/song_p.psarc");
        assert!(line.contains("\"outcome\":\"failed\""));
        assert!(chrono::DateTime::parse_from_rfc3339(&parsed.timestamp).is_ok());
    }

    #[test]
    fn test_report_writer_appends() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ReportWriter::in_dir(&temp_dir.path().join("out"));

        writer
            .write(&ReportEntry::new(Path::new("a"), None, SongOutcome::Converted))
            .unwrap();
        writer
            .write(&ReportEntry::new(Path::new("b"), None, SongOutcome::Skipped))
            .unwrap();

        let entries = read_report_file(writer.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].outcome, SongOutcome::Skipped);
        assert!(entries[0].message.is_none());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::default();
        summary.record(SongOutcome::Converted);
        summary.record(SongOutcome::Converted);
        summary.record(SongOutcome::Failed);

        assert_eq!(summary.converted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);
    }
}
