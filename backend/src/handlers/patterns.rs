use crate::AppState;
use crate::patterns::PatternError;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

fn status_for(error: &PatternError) -> StatusCode {
    match error {
        PatternError::DirectoryMissing => StatusCode::SERVICE_UNAVAILABLE,
        PatternError::InvalidName(_) => StatusCode::BAD_REQUEST,
        PatternError::NotFound(_) => StatusCode::NOT_FOUND,
        PatternError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn list_patterns(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let names = state.patterns.list().map_err(|e| {
        tracing::error!("Failed to list patterns: {}", e);
        (status_for(&e), e.to_string())
    })?;
    Ok(Json(names))
}

pub async fn get_pattern_content(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<String, (StatusCode, String)> {
    let content = state.patterns.content(&name).map_err(|e| {
        if !matches!(e, PatternError::NotFound(_)) {
            tracing::error!("Failed to read pattern {}: {}", name, e);
        }
        (status_for(&e), e.to_string())
    })?;
    Ok(content.to_string())
}
