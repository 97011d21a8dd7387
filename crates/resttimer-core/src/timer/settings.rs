use serde::{Deserialize, Serialize};

use super::history::DEFAULT_HISTORY_CAPACITY;

/// Engine tunables, usually built from [`crate::Config::timer_settings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Target of the idle session a fresh engine starts with.
    pub default_target_secs: u32,
    /// Floor applied to every target passed to the engine.
    pub min_target_secs: u32,
    pub default_total_sets: u32,
    /// Remaining-time marks that raise a warning. Kept sorted, highest first.
    pub warning_thresholds_secs: Vec<u32>,
    /// Whether a reconciliation jump announces thresholds it skipped over.
    pub fire_skipped_on_reconcile: bool,
    pub history_capacity: usize,
}

impl TimerSettings {
    /// Sorts thresholds highest first and removes zero and duplicate marks.
    pub fn normalized(mut self) -> Self {
        self.warning_thresholds_secs.retain(|&t| t > 0);
        self.warning_thresholds_secs.sort_unstable_by(|a, b| b.cmp(a));
        self.warning_thresholds_secs.dedup();
        self.min_target_secs = self.min_target_secs.max(1);
        self.default_target_secs = self.default_target_secs.max(self.min_target_secs);
        self.default_total_sets = self.default_total_sets.max(1);
        self.history_capacity = self.history_capacity.max(1);
        self
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            default_target_secs: 90,
            min_target_secs: 1,
            default_total_sets: 3,
            warning_thresholds_secs: vec![30, 10],
            fire_skipped_on_reconcile: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_sorts_and_drops_zero() {
        let s = TimerSettings {
            warning_thresholds_secs: vec![10, 0, 30, 10],
            min_target_secs: 0,
            history_capacity: 0,
            ..TimerSettings::default()
        }
        .normalized();
        assert_eq!(s.warning_thresholds_secs, vec![30, 10]);
        assert_eq!(s.min_target_secs, 1);
        assert_eq!(s.history_capacity, 1);
    }
}
