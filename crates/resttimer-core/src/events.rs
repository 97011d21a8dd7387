use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{RestHistoryEntry, RestSession, RestState, WarningLevel};

/// Every state change of the rest timer produces an Event.
/// UI layers render from them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    RestStarted {
        exercise_label: String,
        set_index: u32,
        total_sets: u32,
        target_secs: u32,
        at: DateTime<Utc>,
    },
    RestPaused {
        elapsed_secs: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    RestResumed {
        elapsed_secs: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    RestReset {
        target_secs: u32,
        at: DateTime<Utc>,
    },
    /// Target changed through a preset or an adjustment. The session was reset.
    TargetChanged {
        previous_secs: u32,
        target_secs: u32,
        preset: Option<String>,
        at: DateTime<Utc>,
    },
    SetAdvanced {
        set_index: u32,
        total_sets: u32,
        at: DateTime<Utc>,
    },
    /// One second of rest counted.
    Tick {
        elapsed_secs: u32,
        remaining_secs: u32,
        progress: f64,
        at: DateTime<Utc>,
    },
    /// Remaining time reached a warning threshold. Fired once per threshold per session.
    Warning {
        threshold_secs: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// The session is the finished rest, in state `Completed`.
    RestCompleted {
        entry: RestHistoryEntry,
        session: RestSession,
        at: DateTime<Utc>,
    },
    /// Wall-clock time spent suspended was added in one jump.
    GapReconciled {
        gap_secs: u64,
        elapsed_secs: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: RestState,
        exercise_label: String,
        set_index: u32,
        total_sets: u32,
        target_secs: u32,
        elapsed_secs: u32,
        remaining_secs: u32,
        progress: f64,
        warning_level: WarningLevel,
        history_len: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::RestStarted { at, .. }
            | Event::RestPaused { at, .. }
            | Event::RestResumed { at, .. }
            | Event::RestReset { at, .. }
            | Event::TargetChanged { at, .. }
            | Event::SetAdvanced { at, .. }
            | Event::Tick { at, .. }
            | Event::Warning { at, .. }
            | Event::RestCompleted { at, .. }
            | Event::GapReconciled { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }

    /// True for the events a UI should surface to the user (haptics, alerts).
    pub fn is_alert(&self) -> bool {
        matches!(self, Event::Warning { .. } | Event::RestCompleted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_tag() {
        let ev = Event::Warning {
            threshold_secs: 10,
            remaining_secs: 10,
            at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["threshold_secs"], 10);
        assert!(ev.is_alert());
        assert_eq!(ev.at(), DateTime::<Utc>::UNIX_EPOCH);
    }
}
