//! Activity log: one JSONL record per request outcome, poll failure and
//! settings change.
//!
//! Log file: `~/.threatwatch/activity.jsonl` (or `$THREATWATCH_HOME/activity.jsonl`).
//! Writing is best-effort; failures are silently ignored so logging can
//! never interrupt the dashboard. Set `THREATWATCH_ACTIVITY_LOG=0` to disable.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::settings;

/// A single activity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    /// `"info"`, `"warn"` or `"error"`.
    pub level: String,
    /// Dotted event name, e.g. `"request.failed"`.
    pub event: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl ActivityEntry {
    pub fn new(level: &str, event: &str, detail: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            level: level.to_string(),
            event: event.to_string(),
            detail: detail.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

pub fn info(event: &str, detail: &str) {
    record(&ActivityEntry::new("info", event, detail));
}

pub fn warn(event: &str, detail: &str) {
    record(&ActivityEntry::new("warn", event, detail));
}

pub fn error(event: &str, detail: &str) {
    record(&ActivityEntry::new("error", event, detail));
}

/// Append an entry to the activity log (best-effort).
pub fn record(entry: &ActivityEntry) {
    if !enabled() {
        return;
    }
    let _ = append_entry(entry);
}

/// Read every well-formed entry from the log. Malformed lines are skipped.
pub fn read_all_entries() -> Vec<ActivityEntry> {
    let Some(path) = activity_log_path() else {
        return Vec::new();
    };
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn enabled() -> bool {
    !matches!(
        std::env::var("THREATWATCH_ACTIVITY_LOG").as_deref(),
        Ok("0") | Ok("false") | Ok("off")
    )
}

fn append_entry(entry: &ActivityEntry) -> anyhow::Result<()> {
    let Some(path) = activity_log_path() else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the activity log file.
pub fn activity_log_path() -> Option<PathBuf> {
    settings::data_dir().map(|dir| dir.join("activity.jsonl"))
}
