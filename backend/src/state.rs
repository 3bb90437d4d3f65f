use crate::config::ServerConfig;
use crate::patterns::PatternCatalog;
use crate::providers::Providers;
use crate::transcript::TranscriptExtractor;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub patterns: Arc<PatternCatalog>,
    pub providers: Providers,
    pub transcripts: Arc<TranscriptExtractor>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            patterns: Arc::new(PatternCatalog::discover(config.patterns_dir.clone())),
            providers: Providers::new(
                http_client(config),
                config.endpoints.clone(),
                config.stream_idle_timeout,
            ),
            transcripts: Arc::new(TranscriptExtractor::new(config.transcript_helper.clone())),
        }
    }
}

fn http_client(config: &ServerConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build HTTP client with timeouts: {}", e);
            reqwest::Client::new()
        })
}
