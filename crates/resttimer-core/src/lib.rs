//! # RestTimer Core Library
//!
//! This library provides the core logic for timing rest periods between
//! exercise sets. All operations are plain in-process calls; the bundled CLI
//! and any UI layer are thin hosts over the same engine.
//!
//! ## Architecture
//!
//! - **Rest Timer**: A tick-driven state machine; the host invokes `tick()`
//!   once per second and reports suspension so lost wall-clock time is
//!   reconciled in one jump
//! - **Lifecycle**: Injected clock plus suspend/resume hooks
//! - **Storage**: SQLite rest log and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`RestTimer`]: Core rest countdown state machine
//! - [`LifecycleMonitor`]: Maps host foreground/background changes onto the timer
//! - [`Database`]: Completed-rest persistence and statistics
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod lifecycle;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use lifecycle::{AppPhase, Clock, LifecycleHooks, LifecycleMonitor, ManualClock, SystemClock};
pub use storage::{Config, Database, RestStats};
pub use timer::{
    Preset, RestHistory, RestHistoryEntry, RestSession, RestState, RestTimer, TimerSettings,
    WarningLevel,
};
