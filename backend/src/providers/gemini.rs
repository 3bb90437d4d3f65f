use super::{BodyLines, Emitter, Prompt, ProviderError, error_for_status, sse};
use serde_json::{Value, json};
use shared::models::{ReasoningEffort, RunRequest, Vendor};

fn thinking_level(effort: ReasoningEffort) -> Option<&'static str> {
    match effort {
        ReasoningEffort::None => None,
        ReasoningEffort::Low => Some("LOW"),
        ReasoningEffort::Medium => Some("MEDIUM"),
        ReasoningEffort::High => Some("HIGH"),
    }
}

pub(crate) fn build_payload(request: &RunRequest, prompt: &Prompt) -> Value {
    let mut generation_config = json!({
        "temperature": request.temperature,
        "topP": request.top_p,
    });
    if let Some(level) = request.reasoning_effort.and_then(thinking_level) {
        generation_config["thinkingConfig"] = json!({ "thinkingLevel": level });
    }

    json!({
        "contents": [
            { "role": "user", "parts": [{ "text": prompt.user }] }
        ],
        "systemInstruction": { "parts": [{ "text": prompt.system }] },
        "generationConfig": generation_config,
    })
}

pub async fn stream(
    http: &reqwest::Client,
    api_base: &str,
    request: &RunRequest,
    prompt: &Prompt,
    emitter: &mut Emitter,
) -> Result<(), ProviderError> {
    let base = request.api_base.as_deref().unwrap_or(api_base);
    let url = format!(
        "{}/models/{}:streamGenerateContent?alt=sse",
        base.trim_end_matches('/'),
        request.model
    );

    let response = http
        .post(&url)
        .header("x-goog-api-key", &request.api_key)
        .json(&build_payload(request, prompt))
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.without_url()))?;

    if !response.status().is_success() {
        return Err(error_for_status(Vendor::Google, &request.model, response).await);
    }

    let mut lines = BodyLines::new(response, emitter.idle_timeout());
    while let Some(line) = lines.next_line().await? {
        let Some(data) = sse::data_field(&line) else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<Value>(data) else {
            continue;
        };
        if let Some(error) = frame.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown API error");
            return Err(ProviderError::Vendor(message.to_string()));
        }
        for text in frame_texts(&frame) {
            emitter.chunk(text).await?;
        }
    }
    Ok(())
}

/// Visible text parts of a `streamGenerateContent` frame; thought summaries are skipped.
fn frame_texts(frame: &Value) -> Vec<&str> {
    frame
        .get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|candidate| candidate.pointer("/content/parts").and_then(Value::as_array))
        .flatten()
        .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect()
}
