//! Append-only interaction history.
//!
//! Each run adds one JSON object per line to `chat_history.txt`, kept next to
//! the executable unless configured elsewhere. The file is never truncated.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// History file name.
pub const HISTORY_FILE: &str = "chat_history.txt";

/// Environment variables consulted for the account name, in order.
const USER_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

/// One question and its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Local time, e.g. `Jun 27 22:20:11`.
    pub timestamp: String,
    pub username: String,
    pub model: String,
    pub prompt: String,
    pub response: String,
}

impl LogRecord {
    /// Record stamped with the current local time and account name.
    pub fn now(model: &str, prompt: &str, response: &str) -> Self {
        Self {
            timestamp: syslog_timestamp(&Local::now()),
            username: current_username(),
            model: model.to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
        }
    }
}

/// Format a time like syslog does: month abbreviation, day, time, no year.
pub fn syslog_timestamp<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format("%b %d %H:%M:%S").to_string()
}

/// Name of the invoking account.
pub fn current_username() -> String {
    USER_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .or_else(account_name)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Password database entry for the real user id.
#[cfg(unix)]
fn account_name() -> Option<String> {
    use nix::unistd::{getuid, User};

    match User::from_uid(getuid()) {
        Ok(user) => user.map(|u| u.name),
        Err(e) => {
            debug!("Password database lookup failed: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn account_name() -> Option<String> {
    None
}

/// The history file.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
}

impl History {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `chat_history.txt` in the directory of the resolved executable.
    pub fn beside_executable() -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to get current executable path")?;
        let exe = exe.canonicalize().unwrap_or(exe);
        let dir = exe
            .parent()
            .context("Executable path has no parent directory")?;
        Ok(Self::at(dir.join(HISTORY_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` as one line.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!("Appended history to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(response: &str) -> LogRecord {
        LogRecord {
            timestamp: "Jun 27 22:20:11".to_string(),
            username: "ops".to_string(),
            model: "gemma3:12b".to_string(),
            prompt: "why is nginx returning 502".to_string(),
            response: response.to_string(),
        }
    }

    #[test]
    fn test_syslog_timestamp() {
        let t = Utc.with_ymd_and_hms(2025, 6, 27, 22, 20, 11).unwrap();
        assert_eq!(syslog_timestamp(&t), "Jun 27 22:20:11");

        let t = Utc.with_ymd_and_hms(2025, 1, 7, 3, 4, 5).unwrap();
        assert_eq!(syslog_timestamp(&t), "Jan 07 03:04:05");
    }

    #[test]
    fn test_record_field_order() {
        let line = serde_json::to_string(&record("ok")).unwrap();
        let keys = ["timestamp", "username", "model", "prompt", "response"];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| line.find(&format!("\"{}\"", k)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_append_adds_one_line_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let history = History::at(dir.path().join(HISTORY_FILE));

        let answer = "Upstream is down or unreachable; check backend health and logs.";
        history.append(&record(answer)).unwrap();
        history.append(&record("Cannot contact ollama server.")).unwrap();

        let contents = std::fs::read_to_string(history.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(contents.ends_with('\n'));

        let first: LogRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.response, answer);
        let second: LogRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.response, "Cannot contact ollama server.");
    }

    #[test]
    fn test_append_keeps_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        std::fs::write(&path, "earlier line\n").unwrap();

        History::at(&path).append(&record("ok")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("earlier line\n"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let history = History::at(dir.path().join("nope").join(HISTORY_FILE));
        assert!(history.append(&record("ok")).is_err());
    }

    #[test]
    fn test_current_username_not_empty() {
        assert!(!current_username().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_account_name_matches_uid() {
        use nix::unistd::{getuid, User};

        let expected = User::from_uid(getuid()).unwrap().map(|u| u.name);
        assert_eq!(account_name(), expected);
    }

    #[test]
    fn test_record_now() {
        let r = LogRecord::now("gemma3:12b", "q", "a");
        assert_eq!(r.model, "gemma3:12b");
        assert_eq!(r.prompt, "q");
        assert_eq!(r.response, "a");
        assert_eq!(r.timestamp.len(), "Jun 27 22:20:11".len());
    }
}
