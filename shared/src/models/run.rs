use super::settings::ReasoningEffort;
use super::strategy::Strategy;
use super::vendor::Vendor;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/run`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub vendor: Vendor,
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base: Option<String>,
    /// Pattern name. The server swaps in the pattern's system prompt when it knows it.
    pub system_prompt: String,
    pub user_input: String,
    pub temperature: f32,
    pub top_p: f32,
    #[serde(default)]
    pub reasoning_effort: Option<ReasoningEffort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
}
