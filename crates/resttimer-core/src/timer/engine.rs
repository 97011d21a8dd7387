//! Rest timer engine implementation.
//!
//! The engine is a tick-driven state machine. It does not use internal
//! threads - the host calls `tick()` once per second while a rest is running,
//! and reports suspension through [`LifecycleHooks`] so wall-clock time lost
//! while no ticks were delivered is added back in one jump.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Completed -> (next set) Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = RestTimer::new(TimerSettings::default());
//! timer.start(90, "Squat", 1, 3);
//! // Once per second:
//! for event in timer.tick() { /* render */ }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::history::{RestHistory, RestHistoryEntry};
use super::preset::Preset;
use super::settings::TimerSettings;
use crate::events::Event;
use crate::lifecycle::{Clock, LifecycleHooks, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Urgency derived from the remaining time and the warning thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Normal,
    /// At or below the highest threshold.
    Approaching,
    /// At or below the lowest threshold.
    Imminent,
}

/// The rest interval between two sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestSession {
    exercise_label: String,
    set_index: u32,
    total_sets: u32,
    target_secs: u32,
    /// Never exceeds `target_secs`.
    elapsed_secs: u32,
    state: RestState,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    /// Thresholds already announced for this session.
    #[serde(default)]
    fired_warnings: Vec<u32>,
}

impl RestSession {
    fn new(exercise_label: String, set_index: u32, total_sets: u32, target_secs: u32) -> Self {
        let set_index = set_index.max(1);
        Self {
            exercise_label,
            set_index,
            total_sets: total_sets.max(set_index),
            target_secs,
            elapsed_secs: 0,
            state: RestState::Idle,
            started_at: None,
            fired_warnings: Vec::new(),
        }
    }

    pub fn exercise_label(&self) -> &str {
        &self.exercise_label
    }

    pub fn set_index(&self) -> u32 {
        self.set_index
    }

    pub fn total_sets(&self) -> u32 {
        self.total_sets
    }

    pub fn target_secs(&self) -> u32 {
        self.target_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.target_secs.saturating_sub(self.elapsed_secs)
    }

    pub fn state(&self) -> RestState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn is_last_set(&self) -> bool {
        self.set_index >= self.total_sets
    }

    /// 0.0 .. 1.0 progress through the rest.
    pub fn progress(&self) -> f64 {
        if self.target_secs == 0 {
            return 0.0;
        }
        (self.elapsed_secs as f64 / self.target_secs as f64).min(1.0)
    }

    fn clear_progress(&mut self) {
        self.elapsed_secs = 0;
        self.state = RestState::Idle;
        self.started_at = None;
        self.fired_warnings.clear();
    }
}

/// Core rest timer.
///
/// Owns exactly one session at a time plus the bounded history of completed
/// rests. Invalid commands are no-ops and return `None` or an empty event list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "C: Default"))]
pub struct RestTimer<C: Clock = SystemClock> {
    settings: TimerSettings,
    session: RestSession,
    history: RestHistory,
    /// Set while the host is suspended with a running rest.
    #[serde(default)]
    suspended_at: Option<DateTime<Utc>>,
    /// Sub-second part of the last reconciled gap, added to the next one.
    #[serde(default)]
    carry_ms: u32,
    #[serde(skip)]
    clock: C,
}

impl RestTimer<SystemClock> {
    pub fn new(settings: TimerSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl Default for RestTimer<SystemClock> {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}

impl<C: Clock> RestTimer<C> {
    /// Create a timer with an idle session at the default target.
    pub fn with_clock(settings: TimerSettings, clock: C) -> Self {
        let settings = settings.normalized();
        let session = RestSession::new(
            String::new(),
            1,
            settings.default_total_sets,
            settings.default_target_secs,
        );
        Self {
            history: RestHistory::with_capacity(settings.history_capacity),
            settings,
            session,
            suspended_at: None,
            carry_ms: 0,
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &RestSession {
        &self.session
    }

    pub fn state(&self) -> RestState {
        self.session.state
    }

    pub fn remaining_secs(&self) -> u32 {
        self.session.remaining_secs()
    }

    pub fn progress(&self) -> f64 {
        self.session.progress()
    }

    pub fn history(&self) -> &RestHistory {
        &self.history
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn suspended_at(&self) -> Option<DateTime<Utc>> {
        self.suspended_at
    }

    pub fn warning_level(&self) -> WarningLevel {
        if !matches!(self.session.state, RestState::Running | RestState::Paused) {
            return WarningLevel::Normal;
        }
        let remaining = self.session.remaining_secs();
        let thresholds = &self.settings.warning_thresholds_secs;
        match (thresholds.last(), thresholds.first()) {
            (Some(&lowest), _) if remaining <= lowest => WarningLevel::Imminent,
            (_, Some(&highest)) if remaining <= highest => WarningLevel::Approaching,
            _ => WarningLevel::Normal,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let s = &self.session;
        Event::StateSnapshot {
            state: s.state,
            exercise_label: s.exercise_label.clone(),
            set_index: s.set_index,
            total_sets: s.total_sets,
            target_secs: s.target_secs,
            elapsed_secs: s.elapsed_secs,
            remaining_secs: s.remaining_secs(),
            progress: s.progress(),
            warning_level: self.warning_level(),
            history_len: self.history.len(),
            at: self.clock.now(),
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Swap in a clock, e.g. after deserializing a persisted timer.
    pub fn set_clock(&mut self, clock: C) {
        self.clock = clock;
    }

    /// Apply new settings without touching the current session's progress.
    pub fn apply_settings(&mut self, settings: TimerSettings) {
        self.settings = settings.normalized();
        self.history.set_capacity(self.settings.history_capacity);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a rest. Ignored when the same rest is already running.
    pub fn start(
        &mut self,
        target_secs: u32,
        exercise_label: impl Into<String>,
        set_index: u32,
        total_sets: u32,
    ) -> Option<Event> {
        let target_secs = self.clamp_target(target_secs as i64);
        let mut session = RestSession::new(exercise_label.into(), set_index, total_sets, target_secs);

        if self.session.state == RestState::Running
            && self.session.exercise_label == session.exercise_label
            && self.session.set_index == session.set_index
            && self.session.total_sets == session.total_sets
            && self.session.target_secs == session.target_secs
        {
            debug!("start ignored: identical rest already running");
            return None;
        }

        let now = self.clock.now();
        session.state = RestState::Running;
        session.started_at = Some(now);
        self.session = session;
        self.suspended_at = None;
        self.carry_ms = 0;

        Some(Event::RestStarted {
            exercise_label: self.session.exercise_label.clone(),
            set_index: self.session.set_index,
            total_sets: self.session.total_sets,
            target_secs,
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.session.state != RestState::Running {
            debug!(state = ?self.session.state, "pause ignored");
            return None;
        }
        self.session.state = RestState::Paused;
        self.suspended_at = None;
        self.carry_ms = 0;
        Some(Event::RestPaused {
            elapsed_secs: self.session.elapsed_secs,
            remaining_secs: self.session.remaining_secs(),
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.session.state != RestState::Paused {
            debug!(state = ?self.session.state, "resume ignored");
            return None;
        }
        self.session.state = RestState::Running;
        Some(Event::RestResumed {
            elapsed_secs: self.session.elapsed_secs,
            remaining_secs: self.session.remaining_secs(),
            at: self.clock.now(),
        })
    }

    /// Back to `Idle` with nothing elapsed. Valid from any state.
    pub fn reset(&mut self) -> Option<Event> {
        self.session.clear_progress();
        self.suspended_at = None;
        self.carry_ms = 0;
        Some(Event::RestReset {
            target_secs: self.session.target_secs,
            at: self.clock.now(),
        })
    }

    pub fn select_preset(&mut self, preset: &Preset) -> Option<Event> {
        let previous_secs = self.session.target_secs;
        self.session.target_secs = self.clamp_target(preset.target_secs as i64);
        self.reset();
        Some(Event::TargetChanged {
            previous_secs,
            target_secs: self.session.target_secs,
            preset: Some(preset.name.clone()),
            at: self.clock.now(),
        })
    }

    /// `target = max(minimum, target + delta)`, then reset.
    pub fn adjust_target(&mut self, delta_secs: i64, minimum_secs: u32) -> Option<Event> {
        let previous_secs = self.session.target_secs;
        let wanted = (previous_secs as i64)
            .saturating_add(delta_secs)
            .max(minimum_secs as i64);
        self.session.target_secs = self.clamp_target(wanted);
        self.reset();
        Some(Event::TargetChanged {
            previous_secs,
            target_secs: self.session.target_secs,
            preset: None,
            at: self.clock.now(),
        })
    }

    /// Replace a completed rest with an idle one for the following set.
    pub fn next_set(&mut self) -> Option<Event> {
        if self.session.state != RestState::Completed || self.session.is_last_set() {
            debug!(
                state = ?self.session.state,
                set_index = self.session.set_index,
                "next set ignored"
            );
            return None;
        }
        self.session = RestSession::new(
            std::mem::take(&mut self.session.exercise_label),
            self.session.set_index + 1,
            self.session.total_sets,
            self.session.target_secs,
        );
        Some(Event::SetAdvanced {
            set_index: self.session.set_index,
            total_sets: self.session.total_sets,
            at: self.clock.now(),
        })
    }

    /// Count one second. Call once per second while running.
    ///
    /// Emits `Tick`, then a `Warning` when the remaining time equals a
    /// threshold for the first time, then `RestCompleted` on the final second.
    ///
    /// A tick delivered while suspended (ticks may keep arriving in
    /// `Inactive`) moves the suspension baseline up to now, so the counted
    /// second is not reconciled again on resume.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.session.state != RestState::Running {
            return Vec::new();
        }
        let now = self.clock.now();
        if self.suspended_at.is_some() {
            self.suspended_at = Some(now);
        }
        self.carry_ms = 0;
        let s = &mut self.session;
        s.elapsed_secs = s.elapsed_secs.saturating_add(1).min(s.target_secs);
        let remaining = s.remaining_secs();

        let mut events = vec![Event::Tick {
            elapsed_secs: s.elapsed_secs,
            remaining_secs: remaining,
            progress: s.progress(),
            at: now,
        }];

        if remaining == 0 {
            events.push(self.complete(now));
        } else {
            events.extend(self.fire_warnings(remaining, remaining, now));
        }
        events
    }

    /// Add wall-clock time that passed while no ticks were delivered.
    ///
    /// The gap is counted in whole seconds and clamped to the remaining time.
    /// Only a running rest is affected.
    pub fn reconcile_background_gap(
        &mut self,
        backgrounded_at: DateTime<Utc>,
        resumed_at: DateTime<Utc>,
    ) -> Vec<Event> {
        if self.session.state != RestState::Running {
            debug!(state = ?self.session.state, "reconcile ignored");
            return Vec::new();
        }
        let gap_ms = (resumed_at - backgrounded_at).num_milliseconds().max(0);
        let gap_secs = (gap_ms / 1000) as u64;
        if gap_secs == 0 {
            return Vec::new();
        }

        let before = self.session.remaining_secs();
        let jump = gap_secs.min(before as u64) as u32;
        self.session.elapsed_secs += jump;
        let after = self.session.remaining_secs();
        debug!(gap_secs, jump, remaining = after, "reconciled background gap");

        let mut events = vec![Event::GapReconciled {
            gap_secs,
            elapsed_secs: self.session.elapsed_secs,
            remaining_secs: after,
            at: resumed_at,
        }];

        if after == 0 {
            events.push(self.complete(resumed_at));
        } else if self.settings.fire_skipped_on_reconcile {
            events.extend(self.fire_warnings(before.saturating_sub(1), after, resumed_at));
        } else {
            events.extend(self.fire_warnings(after, after, resumed_at));
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn clamp_target(&self, secs: i64) -> u32 {
        secs.clamp(self.settings.min_target_secs as i64, u32::MAX as i64) as u32
    }

    /// Warnings for unfired thresholds within `low..=high` remaining seconds.
    fn fire_warnings(&mut self, high: u32, low: u32, at: DateTime<Utc>) -> Vec<Event> {
        let remaining = self.session.remaining_secs();
        let mut events = Vec::new();
        for &threshold in &self.settings.warning_thresholds_secs {
            if threshold > high || threshold < low {
                continue;
            }
            if self.session.fired_warnings.contains(&threshold) {
                continue;
            }
            self.session.fired_warnings.push(threshold);
            events.push(Event::Warning {
                threshold_secs: threshold,
                remaining_secs: remaining,
                at,
            });
        }
        events
    }

    fn complete(&mut self, at: DateTime<Utc>) -> Event {
        let s = &mut self.session;
        s.state = RestState::Completed;
        self.suspended_at = None;
        self.carry_ms = 0;

        let entry = RestHistoryEntry {
            id: Uuid::new_v4().to_string(),
            exercise_label: s.exercise_label.clone(),
            set_index: s.set_index,
            target_secs: s.target_secs,
            actual_secs: s.elapsed_secs,
            completed_at: at,
        };
        info!(
            exercise = %entry.exercise_label,
            set_index = entry.set_index,
            secs = entry.actual_secs,
            "rest completed"
        );
        self.history.push(entry.clone());

        Event::RestCompleted {
            entry,
            session: s.clone(),
            at,
        }
    }
}

impl<C: Clock> LifecycleHooks for RestTimer<C> {
    fn on_suspend(&mut self) {
        if self.session.state == RestState::Running && self.suspended_at.is_none() {
            self.suspended_at = Some(self.clock.now());
        }
    }

    /// Reconciles the time since `on_suspend`. The sub-second remainder is
    /// kept and counted with the next gap.
    fn on_resume(&mut self) -> Vec<Event> {
        let Some(since) = self.suspended_at.take() else {
            return Vec::new();
        };
        let now = self.clock.now();
        let carried = chrono::Duration::milliseconds(i64::from(std::mem::take(&mut self.carry_ms)));
        let since = since - carried;
        let events = self.reconcile_background_gap(since, now);
        if self.session.state == RestState::Running {
            let gap_ms = (now - since).num_milliseconds().max(0);
            self.carry_ms = (gap_ms % 1000) as u32;
        }
        events
    }
}
