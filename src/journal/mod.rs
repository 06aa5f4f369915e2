//! Bounded in-memory audit journal.
//!
//! Every component of the sentinel (watcher, brain, hammer, system) records
//! its actions here. The journal is newest-first, capped, and append-only:
//! entries are never mutated after insertion, and insertion order is
//! authoritative even if wall-clock timestamps skew.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Default cap on retained entries.
pub const DEFAULT_CAPACITY: usize = 50;

/// Which sentinel role produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogSource {
    Watcher,
    Brain,
    Hammer,
    System,
}

impl std::fmt::Display for LogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogSource::Watcher => write!(f, "WATCHER"),
            LogSource::Brain => write!(f, "BRAIN"),
            LogSource::Hammer => write!(f, "HAMMER"),
            LogSource::System => write!(f, "SYSTEM"),
        }
    }
}

/// Severity of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
    Success,
}

/// A single audit record.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source: LogSource,
    pub message: String,
    pub severity: LogSeverity,
}

/// Newest-first ring of audit records, bounded to `capacity`.
#[derive(Debug)]
pub struct Journal {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Journal {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Create a journal pre-seeded with the boot entries shown on a fresh
    /// console: core init, probe fleet size, and the analyzer mode line.
    pub fn with_boot_entries(capacity: usize, region_count: usize, analyzer_note: &str) -> Self {
        let mut journal = Self::new(capacity);
        journal.append(
            LogSource::System,
            "Sentinel Core initialized.",
            LogSeverity::Info,
        );
        journal.append(
            LogSource::Watcher,
            format!("Probe configuration loaded: {} Regions.", region_count),
            LogSeverity::Info,
        );
        journal.append(LogSource::Brain, analyzer_note, LogSeverity::Info);
        journal
    }

    /// Append an entry. Assigns a fresh id and timestamp, prepends, and
    /// drops the logically oldest entry once over capacity.
    pub fn append(
        &mut self,
        source: LogSource,
        message: impl Into<String>,
        severity: LogSeverity,
    ) {
        self.entries.push_front(LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source,
            message: message.into(),
            severity,
        });
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Cloned snapshot, newest-first, for the read-only display surface.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Count entries matching a source and severity. Used by callers that
    /// assert on journal contents (drill reports, tests).
    pub fn count_matching(&self, source: LogSource, severity: LogSeverity) -> usize {
        self.entries
            .iter()
            .filter(|e| e.source == source && e.severity == severity)
            .count()
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_is_newest_first() {
        let mut journal = Journal::new(10);
        journal.append(LogSource::System, "first", LogSeverity::Info);
        journal.append(LogSource::Hammer, "second", LogSeverity::Success);

        let snap = journal.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].message, "second");
        assert_eq!(snap[1].message, "first");
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut journal = Journal::new(50);
        for i in 0..60 {
            journal.append(LogSource::Watcher, format!("entry {}", i), LogSeverity::Info);
        }

        assert_eq!(journal.len(), 50);
        // Newest survives, the earliest ten are gone.
        let snap = journal.snapshot();
        assert_eq!(snap[0].message, "entry 59");
        assert_eq!(snap[49].message, "entry 10");
    }

    #[test]
    fn test_boot_entries() {
        let journal = Journal::with_boot_entries(50, 3, "Local heuristic analyzer ready.");
        assert_eq!(journal.len(), 3);

        let snap = journal.snapshot();
        // Seeded in order, so the analyzer line is newest.
        assert_eq!(snap[0].source, LogSource::Brain);
        assert_eq!(snap[1].message, "Probe configuration loaded: 3 Regions.");
        assert_eq!(snap[2].source, LogSource::System);
        assert!(snap.iter().all(|e| e.severity == LogSeverity::Info));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut journal = Journal::new(10);
        journal.append(LogSource::Brain, "a", LogSeverity::Info);
        journal.append(LogSource::Brain, "b", LogSeverity::Info);

        let snap = journal.snapshot();
        assert_ne!(snap[0].id, snap[1].id);
    }

    #[test]
    fn test_serializes_with_wire_casing() {
        let mut journal = Journal::new(10);
        journal.append(LogSource::Hammer, "TTL Flushed.", LogSeverity::Warning);

        let json = serde_json::to_value(&journal.snapshot()[0]).unwrap();
        assert_eq!(json["source"], "HAMMER");
        assert_eq!(json["severity"], "warning");
    }
}
