use crate::AppState;
use crate::patterns::PatternCatalog;
use crate::providers::Prompt;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use shared::models::{RunRequest, Strategy};
use std::convert::Infallible;
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 64;

/// Use the pattern's `system.md` when `name` is a known pattern, else the text
/// as given, then append the strategy if one was chosen.
fn resolve_system_prompt(
    patterns: &PatternCatalog,
    name: &str,
    strategy: Option<Strategy>,
) -> String {
    let system = if patterns.contains(name) {
        match patterns.content(name) {
            Ok(content) => content.to_string(),
            Err(e) => {
                tracing::warn!("Falling back to literal system prompt for {}: {}", name, e);
                name.to_string()
            }
        }
    } else {
        name.to_string()
    };
    match strategy {
        Some(strategy) => strategy.apply(&system),
        None => system,
    }
}

pub async fn run_pattern(
    State(state): State<AppState>,
    Json(payload): Json<RunRequest>,
) -> Response {
    if payload.vendor.requires_credential() && payload.api_key.trim().is_empty() {
        return (StatusCode::UNAUTHORIZED, "Missing API Key").into_response();
    }

    let prompt = Prompt {
        system: resolve_system_prompt(&state.patterns, &payload.system_prompt, payload.strategy),
        user: payload.user_input.clone(),
    };
    tracing::info!(
        vendor = %payload.vendor,
        model = %payload.model,
        pattern = %payload.system_prompt,
        strategy = ?payload.strategy,
        "Running pattern"
    );

    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let providers = state.providers.clone();
    tokio::spawn(async move { providers.run(payload, prompt, tx).await });

    let body = Body::from_stream(async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let terminal = event.is_terminal();
            yield Ok::<String, Infallible>(event.to_frame());
            if terminal {
                break;
            }
        }
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(dir: &std::path::Path) -> PatternCatalog {
        std::fs::create_dir(dir.join("summarize")).unwrap();
        std::fs::write(dir.join("summarize/system.md"), "# IDENTITY\nSummarize.").unwrap();
        PatternCatalog::new(Some(dir.to_path_buf()))
    }

    #[test]
    fn unknown_pattern_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(dir.path());

        assert_eq!(
            resolve_system_prompt(&catalog, "summarize", None),
            "# IDENTITY\nSummarize."
        );
        assert_eq!(
            resolve_system_prompt(&catalog, "You are a pirate.", None),
            "You are a pirate."
        );
        assert_eq!(resolve_system_prompt(&catalog, "../etc", None), "../etc");
    }

    #[test]
    fn strategy_follows_the_pattern_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(dir.path());

        let system = resolve_system_prompt(&catalog, "summarize", Some(Strategy::ChainOfThought));
        assert_eq!(
            system,
            format!(
                "# IDENTITY\nSummarize.\n\n---\nSTRATEGY: {}",
                Strategy::ChainOfThought.prompt()
            )
        );
        assert!(
            resolve_system_prompt(&catalog, "Be brief.", Some(Strategy::Socratic))
                .starts_with("Be brief.\n\n---\nSTRATEGY: Before answering")
        );
    }
}
