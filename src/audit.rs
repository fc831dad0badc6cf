//! Append-only audit trail of admin and student actions.
//!
//! Auditing is a collaborator, not a concern of the engine: the caller
//! records what happened after the engine succeeds. A failure to append is
//! reported but is never allowed to fail the operation it describes.

use std::{fs::OpenOptions, io, path::PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HEADER: [&str; 5] = ["timestamp", "user_id", "user_role", "action", "details"];

/// One audited action.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
    /// Who did it, e.g. `admin` or a student id.
    pub user_id: String,
    /// The actor's role.
    pub user_role: String,
    /// Short action name, e.g. `issue_book`.
    pub action: String,
    /// Free-form detail, e.g. the ids involved.
    pub details: String,
}

impl AuditEntry {
    /// Builds an entry stamped with the current time.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        user_role: impl Into<String>,
        action: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user_id.into(),
            user_role: user_role.into(),
            action: action.into(),
            details: details.into(),
        }
    }
}

/// Sink for audit entries.
pub trait AuditLog {
    /// Appends one entry to the trail.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    fn append(&mut self, entry: &AuditEntry) -> io::Result<()>;
}

/// Audit trail as a single CSV file, one row per action.
///
/// The header row is written when the file is first created; rows are only
/// ever appended.
#[derive(Debug, Clone)]
pub struct CsvAudit {
    path: PathBuf,
}

impl CsvAudit {
    /// Logs to the CSV file at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the trail back, oldest first, optionally limited to the last
    /// `limit` rows.
    ///
    /// A missing file reads as an empty trail. Rows whose timestamp no
    /// longer parses are skipped rather than failing the whole read.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid CSV.
    pub fn tail(&self, limit: Option<usize>) -> io::Result<Vec<AuditEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let timestamp = record
                .get(0)
                .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok())
                .map(|t| t.and_utc());
            let Some(timestamp) = timestamp else {
                tracing::warn!("skipping audit row with unparseable timestamp");
                continue;
            };
            entries.push(AuditEntry {
                timestamp,
                user_id: record.get(1).unwrap_or_default().to_string(),
                user_role: record.get(2).unwrap_or_default().to_string(),
                action: record.get(3).unwrap_or_default().to_string(),
                details: record.get(4).unwrap_or_default().to_string(),
            });
        }

        if let Some(limit) = limit {
            let skip = entries.len().saturating_sub(limit);
            entries.drain(..skip);
        }
        Ok(entries)
    }
}

impl AuditLog for CsvAudit {
    fn append(&mut self, entry: &AuditEntry) -> io::Result<()> {
        let new_file = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::Writer::from_writer(file);
        if new_file {
            writer.write_record(HEADER)?;
        }
        writer.write_record([
            &entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &entry.user_id,
            &entry.user_role,
            &entry.action,
            &entry.details,
        ])?;
        writer.flush()
    }
}
