use serde::{Deserialize, Serialize};

/// Shown when the pattern catalog cannot be reached.
pub const DEMO_PATTERNS: [&str; 5] = [
    "summarize",
    "extract_wisdom",
    "analyze_paper",
    "create_summary",
    "explain_code",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Pattern {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

impl From<String> for Pattern {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
