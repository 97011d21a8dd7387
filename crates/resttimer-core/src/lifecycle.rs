//! Host lifecycle and wall-clock seam.
//!
//! The rest timer never reads the system clock directly. It asks an injected
//! [`Clock`], and it learns about suspension through [`LifecycleHooks`]
//! driven by a [`LifecycleMonitor`]. Hosts feed the monitor whatever
//! foreground/background notifications their platform delivers.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Source of wall-clock time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests and simulations.
///
/// Clones share the same instant, so a test can keep one handle while the
/// timer owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    epoch_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            epoch_ms: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.epoch_ms.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.epoch_ms
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.epoch_ms.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Foreground state of the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppPhase {
    Active,
    /// Transitional state (e.g. an incoming call overlay). Ticks may stop or
    /// keep arriving; a tick moves the suspension baseline forward.
    Inactive,
    Background,
}

/// Implemented by anything that must react to the host being suspended.
pub trait LifecycleHooks {
    /// The host is about to stop delivering ticks.
    fn on_suspend(&mut self);

    /// The host is active again. Must run before the next tick.
    fn on_resume(&mut self) -> Vec<Event>;
}

/// Turns raw phase notifications into suspend/resume calls.
///
/// Leaving `Active` counts as a suspend and returning to `Active` counts as a
/// resume. Moves between `Inactive` and `Background` are ignored so a single
/// suspension is never counted twice.
#[derive(Debug, Clone)]
pub struct LifecycleMonitor {
    phase: AppPhase,
}

impl LifecycleMonitor {
    pub fn new() -> Self {
        Self {
            phase: AppPhase::Active,
        }
    }

    pub fn phase(&self) -> AppPhase {
        self.phase
    }

    /// Record a phase change and forward it to `hooks`.
    pub fn transition<H: LifecycleHooks>(&mut self, next: AppPhase, hooks: &mut H) -> Vec<Event> {
        let prev = std::mem::replace(&mut self.phase, next);
        match (prev, next) {
            (AppPhase::Active, AppPhase::Inactive | AppPhase::Background) => {
                hooks.on_suspend();
                Vec::new()
            }
            (AppPhase::Inactive | AppPhase::Background, AppPhase::Active) => hooks.on_resume(),
            _ => Vec::new(),
        }
    }
}

impl Default for LifecycleMonitor {
    fn default() -> Self {
        Self::new()
    }
}
