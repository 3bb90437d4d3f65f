use super::{Emitter, Prompt, ProviderError};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ReasoningEffort,
    },
};
use futures::StreamExt;
use shared::models::{self, RunRequest};

fn reasoning_effort(effort: models::ReasoningEffort) -> Option<ReasoningEffort> {
    match effort {
        models::ReasoningEffort::None => None,
        models::ReasoningEffort::Low => Some(ReasoningEffort::Low),
        models::ReasoningEffort::Medium => Some(ReasoningEffort::Medium),
        models::ReasoningEffort::High => Some(ReasoningEffort::High),
    }
}

fn openai_error(e: OpenAIError) -> ProviderError {
    match e {
        OpenAIError::ApiError(api) => ProviderError::Vendor(format!("OpenAI Error: {}", api.api_error.message)),
        other => ProviderError::Vendor(format!("OpenAI Error: {}", other)),
    }
}

pub(crate) fn build_request(
    request: &RunRequest,
    prompt: &Prompt,
) -> Result<CreateChatCompletionRequest, ProviderError> {
    let build_failed =
        |e: OpenAIError| ProviderError::Vendor(format!("Failed to build completion request: {}", e));

    let system = ChatCompletionRequestSystemMessageArgs::default()
        .content(prompt.system.clone())
        .build()
        .map_err(build_failed)?;
    let user = ChatCompletionRequestUserMessageArgs::default()
        .content(prompt.user.clone())
        .build()
        .map_err(build_failed)?;

    let mut builder = CreateChatCompletionRequestArgs::default();
    builder
        .model(request.model.clone())
        .messages(vec![
            ChatCompletionRequestMessage::System(system),
            ChatCompletionRequestMessage::User(user),
        ])
        .temperature(request.temperature)
        .top_p(request.top_p);

    // Only reasoning models accept the parameter, so it is sent only when asked for.
    if let Some(effort) = request.reasoning_effort.and_then(reasoning_effort) {
        builder.reasoning_effort(effort);
    }

    builder.build().map_err(build_failed)
}

pub async fn stream(
    api_base: &str,
    request: &RunRequest,
    prompt: &Prompt,
    emitter: &mut Emitter,
) -> Result<(), ProviderError> {
    let api_base = request.api_base.as_deref().unwrap_or(api_base);
    let config = OpenAIConfig::new()
        .with_api_key(request.api_key.clone())
        .with_api_base(api_base.trim_end_matches('/'));
    let client = Client::with_config(config);

    let completion = build_request(request, prompt)?;
    let mut stream = client
        .chat()
        .create_stream(completion)
        .await
        .map_err(openai_error)?;

    let idle_timeout = emitter.idle_timeout();
    while let Some(result) = tokio::time::timeout(idle_timeout, stream.next())
        .await
        .map_err(|_| ProviderError::IdleTimeout(idle_timeout))?
    {
        let response = result.map_err(openai_error)?;
        if let Some(choice) = response.choices.first()
            && let Some(content) = &choice.delta.content
        {
            emitter.chunk(content).await?;
        }
    }
    Ok(())
}
