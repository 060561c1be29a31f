//! Logging service - structured event logging to a JSON lines file
//!
//! Privacy-safe: events carry only event names, commands and error categories.
//! No transaction data (descriptions, amounts, dates) and no passwords are
//! ever logged.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const LOG_FILE: &str = "logs.jsonl";

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Get current unix timestamp in milliseconds
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Generate a unique ID based on timestamp + counter
fn generate_id() -> u64 {
    // Lower 16 bits: counter, the rest: timestamp
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    ((now_ms() as u64) << 16) | counter
}

/// Detect the current platform
fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Entry point for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Library,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Library => "library",
        }
    }
}

/// A log event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Error category label, never the error text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            command: None,
            error_category: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.error_category = Some(category.into());
        self
    }
}

/// One line of the log file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub error_category: Option<String>,
}

/// Service for structured event logging
pub struct LoggingService {
    log_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Create a new logging service writing to `logs.jsonl` in `data_dir`
    pub fn new(
        data_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create log directory: {:?}", data_dir))?;

        let log_path = data_dir.join(LOG_FILE);
        if !log_path.exists() {
            File::create(&log_path).context("Failed to create log file")?;
        }

        Ok(Self {
            log_path,
            entry_point,
            app_version: app_version.into(),
            platform: detect_platform(),
        })
    }

    /// Append an event. Entry point, version and platform are filled in from
    /// the service configuration.
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let entry = LogEntry {
            id: generate_id(),
            timestamp: now_ms(),
            entry_point: self.entry_point.as_str().to_string(),
            app_version: self.app_version.clone(),
            platform: self.platform.to_string(),
            event: event.event,
            command: event.command,
            error_category: event.error_category,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .context("Failed to open log file")?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &entry)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Log a simple event with just a name
    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    /// Record a failed command by its error category
    pub fn log_failure(&self, event: &str, command: &str, category: &str) -> Result<()> {
        self.log(
            LogEvent::new(event)
                .with_command(command)
                .with_category(category),
        )
    }

    /// All entries, oldest first. Unreadable lines are skipped.
    fn entries(&self) -> Result<Vec<LogEntry>> {
        let file = File::open(&self.log_path).context("Failed to open log file")?;
        let entries = BufReader::new(file)
            .lines()
            .map_while(|line| line.ok())
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<LogEntry>(&line).ok())
            .collect();
        Ok(entries)
    }

    fn rewrite(&self, entries: &[LogEntry]) -> Result<()> {
        let file = File::create(&self.log_path).context("Failed to rewrite log file")?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// The last `limit` entries in file order
    pub fn tail(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let mut entries = self.entries()?;
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        Ok(entries)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    /// Drop entries older than `cutoff_ms`; unreadable lines go too.
    /// Returns the number of entries removed.
    pub fn prune(&self, cutoff_ms: i64) -> Result<usize> {
        let entries = self.entries()?;
        let before = entries.len();
        let kept: Vec<LogEntry> = entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff_ms)
            .collect();
        self.rewrite(&kept)?;
        Ok(before - kept.len())
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_service() -> (tempfile::TempDir, LoggingService) {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        (dir, service)
    }

    #[test]
    fn test_logging_service_creation() {
        let (_dir, service) = create_test_service();
        assert!(service.path().exists());
        assert!(service.path().ends_with(LOG_FILE));
        assert_eq!(service.count().unwrap(), 0);
    }

    #[test]
    fn test_log_event_fills_service_fields() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Library, "2.0.0").unwrap();

        service
            .log(LogEvent::new("save_completed").with_command("save"))
            .unwrap();

        let entries = service.tail(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, "save_completed");
        assert_eq!(entries[0].command.as_deref(), Some("save"));
        assert_eq!(entries[0].entry_point, "library");
        assert_eq!(entries[0].app_version, "2.0.0");
        assert!(entries[0].error_category.is_none());
    }

    #[test]
    fn test_failure_records_category_only() {
        let (_dir, service) = create_test_service();

        service.log_failure("stats_failed", "stats", "decryption").unwrap();

        let line = fs::read_to_string(service.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["event"], "stats_failed");
        assert_eq!(value["command"], "stats");
        assert_eq!(value["error_category"], "decryption");
        assert!(value.get("error_message").is_none());
    }

    #[test]
    fn test_tail_keeps_latest_in_file_order() {
        let (_dir, service) = create_test_service();

        service.log_event("first").unwrap();
        service.log_event("second").unwrap();
        service.log_event("third").unwrap();

        let events: Vec<String> = service.tail(2).unwrap().into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec!["second", "third"]);
        assert_eq!(service.tail(10).unwrap().len(), 3);
    }

    #[test]
    fn test_prune() {
        let (_dir, service) = create_test_service();

        service.log_event("event1").unwrap();
        service.log_event("event2").unwrap();

        assert_eq!(service.prune(0).unwrap(), 0);
        assert_eq!(service.count().unwrap(), 2);

        assert_eq!(service.prune(now_ms() + 1000).unwrap(), 2);
        assert_eq!(service.count().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let (_dir, service) = create_test_service();
        service.log_event("good").unwrap();
        fs::write(
            service.path(),
            format!("{}not json\n", fs::read_to_string(service.path()).unwrap()),
        )
        .unwrap();
        service.log_event("also_good").unwrap();

        assert_eq!(service.count().unwrap(), 2);
    }
}
