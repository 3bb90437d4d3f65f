use shared::models::Vendor;
use thiserror::Error;

/// Problems found before anything touches the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a pattern first.")]
    NoPattern,
    #[error("Please provide some input.")]
    EmptyInput,
    #[error("Please add your {} API key in Settings.", .0.display_name())]
    MissingCredential(Vendor),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Why a run ended without completing. `Display` is what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to fetch URL: {0}")]
    Fetch(String),
    #[error("{0}")]
    Transcript(String),
    #[error("{0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid server URL: {0}")]
    BaseUrl(String),
}

impl ApiError {
    /// The body text of a rejected request, or the transport error.
    pub fn message(&self) -> String {
        match self {
            ApiError::Status { status, body } if body.trim().is_empty() => {
                format!("Server returned {status}")
            }
            ApiError::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
