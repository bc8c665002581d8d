use serde::{Deserialize, Serialize};

/// Window attribute a rule pattern is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    #[default]
    Title,
    Class,
}

impl MatchField {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchField::Title => "title",
            MatchField::Class => "class",
        }
    }
}

/// A single rule as stored in the rules file and sent over IPC.
///
/// Missing fields fall back to an empty pattern, title matching and
/// both behaviors off, so partially written records still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowRule {
    pub pattern: String,
    #[serde(rename = "type")]
    pub field: MatchField,
    pub sticky: bool,
    pub above: bool,
}

impl WindowRule {
    pub fn new(pattern: impl Into<String>, field: MatchField, sticky: bool, above: bool) -> Self {
        Self {
            pattern: pattern.into(),
            field,
            sticky,
            above,
        }
    }

    /// Blank patterns disable a rule.
    pub fn is_enabled(&self) -> bool {
        !self.pattern.trim().is_empty()
    }
}
