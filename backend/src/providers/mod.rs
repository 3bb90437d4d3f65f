//! Streaming clients for the supported vendors.
//!
//! Every client pushes text into an [`Emitter`]; [`Providers::run`] turns the
//! outcome into the terminal `Done` / `Error` event so the channel always ends
//! with exactly one of them (unless the receiver went away first).

pub mod anthropic;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod sse;

use crate::config::VendorEndpoints;
use shared::models::{LineBuffer, LineTooLong, RunRequest, StreamEvent, Vendor};
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Authentication failed. Please check your {0} API key in Settings.")]
    Unauthorized(&'static str),
    #[error("Model '{0}' not found. Please select a different model.")]
    ModelNotFound(String),
    #[error("API rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("{0}")]
    Vendor(String),
    #[error("No response received from {0}. Please check your API key and model selection.")]
    EmptyResponse(&'static str),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Stream idle timeout: no data for {0:?}")]
    IdleTimeout(Duration),
    #[error(transparent)]
    LineTooLong(#[from] LineTooLong),
    #[error("Client disconnected")]
    Closed,
}

/// The resolved instruction and user payload for one run.
#[derive(Clone, Debug)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Sends chunks in order and remembers whether any text was produced.
/// Vendor readers take their idle timeout from here.
pub struct Emitter {
    tx: mpsc::Sender<StreamEvent>,
    emitted: bool,
    idle_timeout: Duration,
}

impl Emitter {
    pub fn new(tx: mpsc::Sender<StreamEvent>, idle_timeout: Duration) -> Self {
        Self {
            tx,
            emitted: false,
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub async fn chunk(&mut self, text: &str) -> Result<(), ProviderError> {
        if text.is_empty() {
            return Ok(());
        }
        self.tx
            .send(StreamEvent::Chunk(text.to_string()))
            .await
            .map_err(|_| ProviderError::Closed)?;
        self.emitted = true;
        Ok(())
    }

    pub fn emitted(&self) -> bool {
        self.emitted
    }
}

#[derive(Clone)]
pub struct Providers {
    http: reqwest::Client,
    endpoints: VendorEndpoints,
    idle_timeout: Duration,
}

impl Providers {
    pub fn new(http: reqwest::Client, endpoints: VendorEndpoints, idle_timeout: Duration) -> Self {
        Self {
            http,
            endpoints,
            idle_timeout,
        }
    }

    /// Stream one completion into `tx`, finishing with `Done` or `Error`.
    pub async fn run(&self, request: RunRequest, prompt: Prompt, tx: mpsc::Sender<StreamEvent>) {
        let vendor = request.vendor;
        let mut emitter = Emitter::new(tx.clone(), self.idle_timeout);
        tracing::debug!(%vendor, model = %request.model, "Starting completion stream");

        let mut result = match vendor {
            Vendor::Google => {
                gemini::stream(&self.http, &self.endpoints.google, &request, &prompt, &mut emitter)
                    .await
            }
            Vendor::OpenAi => {
                openai::stream(&self.endpoints.openai, &request, &prompt, &mut emitter).await
            }
            Vendor::Anthropic => {
                anthropic::stream(
                    &self.http,
                    &self.endpoints.anthropic,
                    &request,
                    &prompt,
                    &mut emitter,
                )
                .await
            }
            Vendor::Ollama => ollama::stream(&self.http, &request, &prompt, &mut emitter).await,
        };
        if result.is_ok() && !emitter.emitted() {
            result = Err(ProviderError::EmptyResponse(vendor.display_name()));
        }

        let terminal = match result {
            Ok(()) => StreamEvent::Done,
            Err(ProviderError::Closed) => {
                tracing::debug!(%vendor, "Client went away, stopping stream");
                return;
            }
            Err(e) => {
                tracing::warn!(%vendor, "Completion failed: {}", e);
                StreamEvent::Error(e.to_string())
            }
        };
        let _ = tx.send(terminal).await;
    }
}

/// Map a non-success vendor response to a message a user can act on.
pub(crate) async fn error_for_status(
    vendor: Vendor,
    model: &str,
    response: reqwest::Response,
) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => ProviderError::Unauthorized(vendor.display_name()),
        404 => ProviderError::ModelNotFound(model.to_string()),
        429 => ProviderError::RateLimited,
        code => ProviderError::Api {
            status: code,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        },
    }
}

/// Lines of a streaming response body, read chunk by chunk. A read that
/// stalls longer than `idle_timeout` fails the stream.
pub(crate) struct BodyLines {
    response: reqwest::Response,
    lines: LineBuffer,
    pending: VecDeque<String>,
    finished: bool,
    idle_timeout: Duration,
}

impl BodyLines {
    pub(crate) fn new(response: reqwest::Response, idle_timeout: Duration) -> Self {
        Self {
            response,
            lines: LineBuffer::default(),
            pending: VecDeque::new(),
            finished: false,
            idle_timeout,
        }
    }

    pub(crate) async fn next_line(&mut self) -> Result<Option<String>, ProviderError> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(Some(line));
            }
            if self.finished {
                return Ok(None);
            }
            let chunk = tokio::time::timeout(self.idle_timeout, self.response.chunk())
                .await
                .map_err(|_| ProviderError::IdleTimeout(self.idle_timeout))?
                .map_err(|e| ProviderError::Stream(e.to_string()))?;
            match chunk {
                Some(bytes) => self.pending.extend(self.lines.push(&bytes)?),
                None => {
                    self.finished = true;
                    self.pending
                        .extend(std::mem::take(&mut self.lines).finish());
                }
            }
        }
    }
}
