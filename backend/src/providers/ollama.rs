use super::{BodyLines, Emitter, Prompt, ProviderError, error_for_status};
use serde_json::{Value, json};
use shared::models::{DEFAULT_OLLAMA_URL, RunRequest, Vendor};

pub async fn stream(
    http: &reqwest::Client,
    request: &RunRequest,
    prompt: &Prompt,
    emitter: &mut Emitter,
) -> Result<(), ProviderError> {
    let base = request
        .api_base
        .as_deref()
        .filter(|base| !base.trim().is_empty())
        .unwrap_or(DEFAULT_OLLAMA_URL);
    let url = format!("{}/api/chat", base.trim_end_matches('/'));

    let payload = json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": prompt.system },
            { "role": "user", "content": prompt.user }
        ],
        "options": {
            "temperature": request.temperature,
            "top_p": request.top_p,
        },
        "stream": true,
    });

    let response = http
        .post(&url)
        .json(&payload)
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.without_url()))?;

    if !response.status().is_success() {
        return Err(error_for_status(Vendor::Ollama, &request.model, response).await);
    }

    // One JSON object per line.
    let mut lines = BodyLines::new(response, emitter.idle_timeout());
    while let Some(line) = lines.next_line().await? {
        let Ok(obj) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        if let Some(error) = obj.get("error").and_then(Value::as_str) {
            return Err(ProviderError::Vendor(error.to_string()));
        }
        if let Some(text) = obj.pointer("/message/content").and_then(Value::as_str) {
            emitter.chunk(text).await?;
        }
        if obj.get("done").and_then(Value::as_bool) == Some(true) {
            break;
        }
    }
    Ok(())
}
