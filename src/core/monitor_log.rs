/// Append-only monitor log
///
/// One line per entry, `<local timestamp>: <message>`. The file is opened in
/// append mode for every write and never rewritten; pruning is left to
/// logrotate.

use anyhow::{Context, Result};
use chrono::Local;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::utils::LOG_TIMESTAMP_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorLogEntry {
    pub timestamp: String,
    pub message: String,
}

impl MonitorLogEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format(LOG_TIMESTAMP_FORMAT).to_string(),
            message: message.into(),
        }
    }

    /// Parse a line written by `MonitorLog::append`
    pub fn parse(line: &str) -> Option<Self> {
        // The timestamp itself contains ':' so split after its fixed width
        let timestamp = line.get(..19)?;
        let message = line.get(19..)?.strip_prefix(": ")?;
        chrono::NaiveDateTime::parse_from_str(timestamp, LOG_TIMESTAMP_FORMAT).ok()?;

        Some(Self {
            timestamp: timestamp.to_string(),
            message: message.to_string(),
        })
    }
}

impl fmt::Display for MonitorLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.timestamp, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct MonitorLog {
    path: PathBuf,
}

impl MonitorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry stamped with the current local time
    pub fn append(&self, message: &str) -> Result<MonitorLogEntry> {
        let entry = MonitorLogEntry::now(message);
        self.append_entry(&entry)?;
        Ok(entry)
    }

    pub fn append_entry(&self, entry: &MonitorLogEntry) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            }
        }

        // Single write call per line so concurrent appenders do not interleave
        let line = format!("{}\n", entry);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open monitor log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to write monitor log {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "{}", entry.message);
        Ok(())
    }

    /// Last `count` entries, oldest first; lines that do not parse are kept verbatim
    pub fn tail(&self, count: usize) -> Result<Vec<MonitorLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read monitor log {}", self.path.display()))?;

        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(count);

        Ok(lines[start..]
            .iter()
            .map(|line| {
                MonitorLogEntry::parse(line).unwrap_or_else(|| MonitorLogEntry {
                    timestamp: String::new(),
                    message: line.to_string(),
                })
            })
            .collect())
    }
}
