pub mod config;
mod handlers;
pub mod patterns;
pub mod providers;
mod state;
pub mod transcript;

pub use crate::config::ServerConfig;
pub use crate::state::AppState;

use crate::handlers::{
    get_pattern_content, list_patterns, run_pattern, youtube_transcript,
};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

pub fn init(router: Router<AppState>, config: &ServerConfig) -> Router<()> {
    let state = AppState::new(config);

    router
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/patterns", get(list_patterns))
        .route("/api/patterns/{name}", get(get_pattern_content))
        .route("/api/run", post(run_pattern))
        .route("/api/youtube/transcript", post(youtube_transcript))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
