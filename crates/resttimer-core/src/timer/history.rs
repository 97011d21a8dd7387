//! Bounded log of completed rest intervals.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of entries kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// One completed rest interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestHistoryEntry {
    pub id: String,
    pub exercise_label: String,
    pub set_index: u32,
    pub target_secs: u32,
    pub actual_secs: u32,
    pub completed_at: DateTime<Utc>,
}

/// Newest-first history, evicting the oldest entry once full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestHistory {
    capacity: usize,
    entries: VecDeque<RestHistoryEntry>,
}

impl RestHistory {
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, entry: RestHistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Shrinking drops the oldest entries.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&RestHistoryEntry> {
        self.entries.front()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &RestHistoryEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn average_actual_secs(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let total: u64 = self.entries.iter().map(|e| e.actual_secs as u64).sum();
        Some(total as f64 / self.entries.len() as f64)
    }
}

impl Default for RestHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}
