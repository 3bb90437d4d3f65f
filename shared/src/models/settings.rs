use super::strategy::Strategy;
use super::vendor::Vendor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_READER_PROXY: &str = "https://r.jina.ai/";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    System,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    /// `None` means reasoning is off, so nothing is sent to the vendor.
    pub fn enabled(self) -> Option<Self> {
        match self {
            ReasoningEffort::None => None,
            other => Some(other),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub vendor: Vendor,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    /// Vendor -> API key. Empty strings count as "not configured".
    pub credentials: BTreeMap<Vendor, String>,
    pub ollama_url: String,
    pub theme: Theme,
    pub reasoning_effort: ReasoningEffort,
    /// Prompting strategy appended to every pattern; `None` sends the pattern as is.
    pub strategy: Option<Strategy>,
    /// Base URL of the companion server.
    pub server_url: String,
    /// Content-extraction proxy; the page URL is appended verbatim.
    pub reader_proxy: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            vendor: Vendor::Google,
            model: Vendor::Google.default_model().to_string(),
            temperature: 0.7,
            top_p: 0.95,
            credentials: BTreeMap::new(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            theme: Theme::Dark,
            reasoning_effort: ReasoningEffort::None,
            strategy: None,
            server_url: DEFAULT_SERVER_URL.to_string(),
            reader_proxy: DEFAULT_READER_PROXY.to_string(),
        }
    }
}

impl AppSettings {
    pub fn credential(&self, vendor: Vendor) -> Option<&str> {
        self.credentials
            .get(&vendor)
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
    }

    pub fn has_credential(&self, vendor: Vendor) -> bool {
        !vendor.requires_credential() || self.credential(vendor).is_some()
    }

    /// Vendors that have a usable key, for status display.
    pub fn configured_vendors(&self) -> Vec<Vendor> {
        Vendor::ALL
            .into_iter()
            .filter(|v| v.requires_credential() && self.credential(*v).is_some())
            .collect()
    }

    /// Endpoint override sent along with a run. Only the local vendor has one.
    pub fn endpoint_for(&self, vendor: Vendor) -> Option<&str> {
        match vendor {
            Vendor::Ollama => Some(self.ollama_url.as_str()),
            _ => None,
        }
    }
}
