use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// AI service provider a run is sent to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Google,
    OpenAi,
    Anthropic,
    Ollama,
}

impl Vendor {
    pub const ALL: [Vendor; 4] = [
        Vendor::Google,
        Vendor::OpenAi,
        Vendor::Anthropic,
        Vendor::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Google => "google",
            Vendor::OpenAi => "openai",
            Vendor::Anthropic => "anthropic",
            Vendor::Ollama => "ollama",
        }
    }

    /// Human readable name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Vendor::Google => "Google Gemini",
            Vendor::OpenAi => "OpenAI",
            Vendor::Anthropic => "Anthropic",
            Vendor::Ollama => "Ollama (Local)",
        }
    }

    /// Local inference servers run without a key.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, Vendor::Ollama)
    }

    pub fn default_model(&self) -> &'static str {
        self.suggested_models()[0]
    }

    pub fn suggested_models(&self) -> &'static [&'static str] {
        match self {
            Vendor::Google => &[
                "gemini-3-flash-preview",
                "gemini-3-pro-preview",
                "gemini-2.5-pro",
                "gemini-2.5-flash",
                "gemini-2.5-flash-lite",
            ],
            Vendor::OpenAi => &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "o1-mini"],
            Vendor::Anthropic => &[
                "claude-3-7-sonnet-20250219",
                "claude-3-5-sonnet-20241022",
                "claude-3-5-haiku-20241022",
            ],
            Vendor::Ollama => &["llama3.2", "llama3.1", "mistral", "qwen2.5", "phi3"],
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported vendor: {0}")]
pub struct UnknownVendor(pub String);

impl FromStr for Vendor {
    type Err = UnknownVendor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Ok(Vendor::Google),
            "openai" => Ok(Vendor::OpenAi),
            "anthropic" | "claude" => Ok(Vendor::Anthropic),
            "ollama" => Ok(Vendor::Ollama),
            _ => Err(UnknownVendor(s.to_string())),
        }
    }
}
