use crate::api::CompanionApi;
use crate::error::{RunError, ValidationError};
use crate::input::{self, InputSource, PageReader};
use crate::relay::relay;
use crate::store::{OutputAction, OutputBuffer};
use shared::models::{AppSettings, RunRequest};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Cloneable switch that stops the run in progress.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    fn reset(&self) {
        self.tx.send_replace(false);
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Runs one pattern at a time: validate, resolve input, start the backend
/// run and relay its chunks into the output buffer.
pub struct Orchestrator<'a> {
    api: &'a dyn CompanionApi,
    reader: &'a dyn PageReader,
    cancel: CancelHandle,
}

impl<'a> Orchestrator<'a> {
    pub fn new(api: &'a dyn CompanionApi, reader: &'a dyn PageReader) -> Self {
        Self {
            api,
            reader,
            cancel: CancelHandle::new(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Checked in order, before any network call.
    pub fn validate(
        settings: &AppSettings,
        pattern: Option<&str>,
        source: &InputSource,
    ) -> Result<(), ValidationError> {
        if pattern.is_none_or(|name| name.trim().is_empty()) {
            return Err(ValidationError::NoPattern);
        }
        if source.is_blank() {
            return Err(ValidationError::EmptyInput);
        }
        if !settings.has_credential(settings.vendor) {
            return Err(ValidationError::MissingCredential(settings.vendor));
        }
        Ok(())
    }

    fn build_request(settings: &AppSettings, pattern: &str, user_input: String) -> RunRequest {
        RunRequest {
            vendor: settings.vendor,
            model: settings.model.clone(),
            api_key: settings
                .credential(settings.vendor)
                .unwrap_or_default()
                .to_string(),
            api_base: settings.endpoint_for(settings.vendor).map(str::to_string),
            system_prompt: pattern.to_string(),
            user_input,
            temperature: settings.temperature,
            top_p: settings.top_p,
            reasoning_effort: settings.reasoning_effort.enabled(),
            strategy: settings.strategy,
        }
    }

    /// Execute a run. On failure the error is also recorded in `output`,
    /// along with whatever text arrived before it.
    pub async fn run(
        &self,
        settings: &AppSettings,
        pattern: Option<&str>,
        source: &InputSource,
        output: &mut OutputBuffer,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<RunOutcome, RunError> {
        self.cancel.reset();
        let result = self.execute(settings, pattern, source, output, on_chunk).await;
        if let Err(e) = &result
            && output.error().is_none()
        {
            tracing::warn!("Run failed: {}", e);
            output.apply(OutputAction::Fail(e.to_string()));
        }
        result
    }

    async fn execute(
        &self,
        settings: &AppSettings,
        pattern: Option<&str>,
        source: &InputSource,
        output: &mut OutputBuffer,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<RunOutcome, RunError> {
        let run_id = Uuid::new_v4();
        output.apply(OutputAction::Begin(run_id));

        Self::validate(settings, pattern, source)?;
        let pattern = pattern.unwrap_or_default();

        let payload = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(self.cancelled(output)),
            payload = input::resolve(source, self.reader, self.api) => payload?,
        };
        if payload.trim().is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }

        let request = Self::build_request(settings, pattern, payload);
        tracing::info!(
            %run_id,
            vendor = %request.vendor,
            model = %request.model,
            pattern,
            "Starting run"
        );
        output.apply(OutputAction::StartStreaming(run_id));

        let started = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(self.cancelled(output)),
            started = self.api.run_pattern(&request) => started,
        };
        let mut rx = started.map_err(|e| RunError::Backend(e.message()))?;

        relay(&mut rx, output, run_id, &self.cancel, on_chunk).await
    }

    fn cancelled(&self, output: &mut OutputBuffer) -> RunOutcome {
        output.apply(OutputAction::Cancel);
        RunOutcome::Cancelled
    }
}
