//! Bounded, append-only narrative log shown to the player.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Prefix applied to every entry, mimicking a terminal prompt.
pub const ENTRY_PREFIX: &str = "> ";

/// Ring buffer of the most recent human-readable events. Oldest entries are
/// evicted first once `capacity` is reached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredLog")]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<String>,
}

/// Wire form of `EventLog`; converted so saved logs obey the same bounds.
#[derive(Deserialize)]
struct StoredLog {
    capacity: usize,
    entries: VecDeque<String>,
}

impl From<StoredLog> for EventLog {
    fn from(stored: StoredLog) -> Self {
        let mut log = EventLog::new(stored.capacity);
        let skip = stored.entries.len().saturating_sub(log.capacity);
        log.entries.extend(stored.entries.into_iter().skip(skip));
        log
    }
}

impl EventLog {
    /// Create an empty log holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a message, evicting the oldest entry when full.
    pub fn push(&mut self, message: impl AsRef<str>) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries
            .push_back(format!("{ENTRY_PREFIX}{}", message.as_ref()));
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Number of retained entries containing `needle`.
    pub fn occurrences(&self, needle: &str) -> usize {
        self.entries.iter().filter(|e| e.contains(needle)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn entries_are_prefixed() {
        let mut log = EventLog::new(3);
        log.push("System initialized.");
        assert_eq!(log.latest(), Some("> System initialized."));
    }

    #[test]
    fn oldest_entry_is_evicted_first() {
        let mut log = EventLog::new(2);
        log.push("a");
        log.push("b");
        log.push("c");
        let all: Vec<&str> = log.entries().collect();
        assert_eq!(all, vec!["> b", "> c"]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut log = EventLog::new(0);
        log.push("x");
        log.push("y");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest(), Some("> y"));
    }

    #[test]
    fn restored_log_is_clamped() {
        let log: EventLog =
            serde_json::from_str(r#"{"capacity":0,"entries":["> a","> b","> c"]}"#).unwrap();
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.entries().collect::<Vec<_>>(), vec!["> c"]);
        let mut log = log;
        log.push("d");
        assert_eq!(log.latest(), Some("> d"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn saved_log_survives_a_round_trip() {
        let mut log = EventLog::new(4);
        log.push("a");
        log.push("b");
        let text = serde_json::to_string(&log).unwrap();
        let back: EventLog = serde_json::from_str(&text).unwrap();
        assert_eq!(back, log);
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(cap in 1usize..32, pushes in 0usize..200) {
            let mut log = EventLog::new(cap);
            for i in 0..pushes {
                log.push(format!("event {i}"));
            }
            prop_assert!(log.len() <= cap);
            prop_assert_eq!(log.len(), pushes.min(cap));
        }
    }
}
