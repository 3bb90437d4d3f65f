use super::{BodyLines, Emitter, Prompt, ProviderError, error_for_status, sse};
use serde_json::{Value, json};
use shared::models::{RunRequest, Vendor};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub(crate) fn build_payload(request: &RunRequest, prompt: &Prompt) -> Value {
    // Newer models reject temperature and top_p together; temperature wins.
    json!({
        "model": request.model,
        "system": prompt.system,
        "messages": [{ "role": "user", "content": prompt.user }],
        "max_tokens": MAX_TOKENS,
        "temperature": request.temperature.min(1.0),
        "stream": true,
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
    let url = format!("{}/messages", base.trim_end_matches('/'));

    let response = http
        .post(&url)
        .header("x-api-key", &request.api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&build_payload(request, prompt))
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.without_url()))?;

    if !response.status().is_success() {
        return Err(error_for_status(Vendor::Anthropic, &request.model, response).await);
    }

    let mut lines = BodyLines::new(response, emitter.idle_timeout());
    while let Some(line) = lines.next_line().await? {
        let Some(data) = sse::data_field(&line) else {
            continue;
        };
        let Ok(event) = serde_json::from_str::<Value>(data) else {
            continue;
        };
        match event.get("type").and_then(Value::as_str) {
            Some("content_block_delta") => {
                if let Some(text) = event.pointer("/delta/text").and_then(Value::as_str) {
                    emitter.chunk(text).await?;
                }
            }
            Some("error") => {
                let message = event
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown API error");
                return Err(ProviderError::Vendor(message.to_string()));
            }
            Some("message_stop") => break,
            _ => {}
        }
    }
    Ok(())
}
