mod engine;
mod history;
mod preset;
mod settings;

pub use engine::{RestSession, RestState, RestTimer, WarningLevel};
pub use history::{RestHistory, RestHistoryEntry, DEFAULT_HISTORY_CAPACITY};
pub use preset::Preset;
pub use settings::TimerSettings;
