//! Append-only action history
//!
//! Each entry renders as `[YYYY-MM-DD HH:MM] note` and entries are joined
//! with ` || `, which is also the persisted form.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Separator between rendered entries
pub const ENTRY_SEPARATOR: &str = " || ";

/// Timestamp format used inside the brackets
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A single timestamped note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub note: String,
}

impl HistoryEntry {
    pub fn render(&self) -> String {
        format!("[{}] {}", self.at.format(TIMESTAMP_FORMAT), self.note)
    }

    fn parse(raw: &str, fallback_at: DateTime<Utc>) -> Self {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix('[') {
            if let Some((stamp, note)) = rest.split_once(']') {
                if let Ok(at) = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT) {
                    return Self {
                        at: at.and_utc(),
                        note: note.trim_start().to_string(),
                    };
                }
            }
        }
        Self {
            at: fallback_at,
            note: raw.to_string(),
        }
    }
}

/// Ordered log of everything that happened to a case
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionHistory(Vec<HistoryEntry>);

impl ActionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a trimmed note stamped with `at`, truncated to the minute
    ///
    /// A literal separator inside the note would split it in two when the
    /// history is read back, so it is collapsed to a single bar.
    pub fn record(&mut self, at: DateTime<Utc>, note: impl AsRef<str>) {
        let mut note = note.as_ref().trim().to_string();
        while note.contains("||") {
            note = note.replace("||", "|");
        }
        let at = at
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(at);
        self.0.push(HistoryEntry { at, note });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    /// Renders the persisted single-string form
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(HistoryEntry::render)
            .collect::<Vec<_>>()
            .join(ENTRY_SEPARATOR)
    }

    /// Parses the persisted form; entries without a readable timestamp get `fallback_at`
    pub fn parse(raw: &str, fallback_at: DateTime<Utc>) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        Self(
            raw.split(ENTRY_SEPARATOR)
                .filter(|part| !part.trim().is_empty())
                .map(|part| HistoryEntry::parse(part, fallback_at))
                .collect(),
        )
    }
}
