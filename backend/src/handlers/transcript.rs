use crate::AppState;
use axum::{Json, extract::State};
use shared::models::{TranscriptRequest, TranscriptResponse};

/// Failures travel in the envelope's `error` field, always with a 200.
pub async fn youtube_transcript(
    State(state): State<AppState>,
    Json(payload): Json<TranscriptRequest>,
) -> Json<TranscriptResponse> {
    match state.transcripts.extract(&payload).await {
        Ok(response) => Json(response),
        Err(e) => {
            tracing::error!("Transcript extraction failed: {}", e);
            Json(TranscriptResponse::failed(e.to_string()))
        }
    }
}
