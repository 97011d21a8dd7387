use serde::{Deserialize, Serialize};

/// A named rest duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    /// Duration in seconds.
    pub target_secs: u32,
    #[serde(default)]
    pub description: String,
}

impl Preset {
    pub fn new(name: impl Into<String>, target_secs: u32, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_secs,
            description: description.into(),
        }
    }

    /// The built-in presets, shortest first.
    pub fn builtin() -> Vec<Preset> {
        vec![
            Preset::new("Endurance", 30, "Circuits and muscular endurance work"),
            Preset::new("Hypertrophy", 90, "Moderate loads for muscle growth"),
            Preset::new("Strength", 180, "Heavy compound lifts"),
            Preset::new("Power", 300, "Maximal efforts and explosive work"),
        ]
    }

    /// Case-insensitive lookup by name.
    pub fn find<'a>(presets: &'a [Preset], name: &str) -> Option<&'a Preset> {
        presets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Target formatted as `M:SS`.
    pub fn label(&self) -> String {
        format!("{}:{:02}", self.target_secs / 60, self.target_secs % 60)
    }
}
