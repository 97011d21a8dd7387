pub mod config;
pub mod history;
pub mod presets;
pub mod stats;
pub mod timer;
