//! Append-only JSONL audit log
//!
//! One entry per line, appended through the owner-only writer in
//! `storage::file_io`. Entries name login identifiers and user ids, so the
//! log is read back per user: `expense audit` only ever shows the entries
//! attributed to the caller.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::UserId;
use crate::storage::append_line;

use super::entry::AuditEntry;

/// Writes audit entries to a JSONL file
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append an entry
    pub fn log(&self, entry: &AuditEntry) -> ExpenseResult<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| ExpenseError::Json(format!("Failed to serialize audit entry: {}", e)))?;
        append_line(&self.log_path, &line)
    }

    /// Read all entries, oldest first
    pub fn read_all(&self) -> ExpenseResult<Vec<AuditEntry>> {
        self.scan(|_| true)
    }

    /// The last `count` entries attributed to `user_id`, oldest first
    pub fn read_recent_for(&self, user_id: UserId, count: usize) -> ExpenseResult<Vec<AuditEntry>> {
        Ok(last(self.scan(|entry| entry.concerns(user_id))?, count))
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    fn scan(&self, keep: impl Fn(&AuditEntry) -> bool) -> ExpenseResult<Vec<AuditEntry>> {
        let text = match fs::read_to_string(&self.log_path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ExpenseError::Io(format!(
                    "Failed to read audit log {}: {}",
                    self.log_path.display(),
                    e
                )))
            }
        };

        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(line).map_err(|e| {
                ExpenseError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    index + 1,
                    e
                ))
            })?;
            if keep(&entry) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }
}

fn last(mut entries: Vec<AuditEntry>, count: usize) -> Vec<AuditEntry> {
    let start = entries.len().saturating_sub(count);
    entries.split_off(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{EntityType, Operation};
    use tempfile::TempDir;

    fn create_test_logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        (logger, temp_dir)
    }

    fn failure(identifier: &str) -> AuditEntry {
        AuditEntry::event(
            Operation::LoginFailure,
            EntityType::User,
            identifier,
            "invalid credentials",
        )
    }

    #[test]
    fn test_empty_log() {
        let (logger, _temp) = create_test_logger();
        assert!(logger.read_all().unwrap().is_empty());
        assert!(logger.read_recent_for(UserId::new(), 5).unwrap().is_empty());
    }

    #[test]
    fn test_read_recent_keeps_order() {
        let (logger, _temp) = create_test_logger();
        let alice = UserId::new();
        for i in 0..10 {
            logger.log(&failure(&format!("attempt{}", i)).by(alice)).unwrap();
        }

        let recent = logger.read_recent_for(alice, 3).unwrap();
        let ids: Vec<_> = recent.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, ["attempt7", "attempt8", "attempt9"]);
        assert!(logger.read_recent_for(alice, 0).unwrap().is_empty());
    }

    #[test]
    fn test_read_recent_for_only_returns_own_entries() {
        let (logger, _temp) = create_test_logger();
        let alice = UserId::new();
        let bob = UserId::new();

        logger.log(&failure("alice").by(alice)).unwrap();
        logger.log(&failure("bob").by(bob)).unwrap();
        logger.log(&failure("nobody")).unwrap();
        logger
            .log(&AuditEntry::event(Operation::LoginSuccess, EntityType::User, "alice", "ok").by(alice))
            .unwrap();

        let mine = logger.read_recent_for(alice, 10).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|e| e.concerns(alice)));
        assert_eq!(mine[1].operation, Operation::LoginSuccess);

        let latest = logger.read_recent_for(alice, 1).unwrap();
        assert_eq!(latest[0].operation, Operation::LoginSuccess);
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let (logger, _temp) = create_test_logger();
        logger.log(&failure("alice")).unwrap();
        let mut text = fs::read_to_string(logger.path()).unwrap();
        text.push_str("{\"not\": \"an entry\"}\n");
        fs::write(logger.path(), text).unwrap();

        let err = logger.read_all().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_appends_across_instances() {
        let (logger, temp) = create_test_logger();
        logger.log(&failure("alice")).unwrap();

        let reopened = AuditLogger::new(temp.path().join("audit.log"));
        reopened.log(&failure("bob")).unwrap();

        assert_eq!(reopened.read_all().unwrap().len(), 2);
    }
}
