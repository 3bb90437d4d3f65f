use crate::error::ApiError;
use async_trait::async_trait;
use shared::models::{
    LineBuffer, Pattern, RunRequest, StreamEvent, TranscriptRequest, TranscriptResponse,
};
use tokio::sync::mpsc;
use url::Url;

const EVENT_BUFFER: usize = 64;

/// Everything the client needs from the companion server.
#[async_trait]
pub trait CompanionApi: Send + Sync {
    async fn list_patterns(&self) -> Result<Vec<Pattern>, ApiError>;
    async fn pattern_content(&self, name: &str) -> Result<String, ApiError>;
    async fn youtube_transcript(
        &self,
        request: &TranscriptRequest,
    ) -> Result<TranscriptResponse, ApiError>;
    /// Start a run. Events arrive in order; the channel closes after a
    /// terminal event or when the connection drops.
    async fn run_pattern(
        &self,
        request: &RunRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ApiError>;
}

pub struct HttpCompanion {
    http: reqwest::Client,
    base: String,
}

impl HttpCompanion {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(http: reqwest::Client, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { http, base }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }

    /// `/api/patterns/<name>` with `name` percent-encoded as one segment.
    fn pattern_url(&self, name: &str) -> Result<Url, ApiError> {
        let invalid = || ApiError::BaseUrl(self.base.clone());
        let mut url = Url::parse(&self.url("/patterns")).map_err(|_| invalid())?;
        url.path_segments_mut().map_err(|_| invalid())?.push(name);
        Ok(url)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CompanionApi for HttpCompanion {
    async fn list_patterns(&self) -> Result<Vec<Pattern>, ApiError> {
        let response = check(self.http.get(self.url("/patterns")).send().await?).await?;
        let names: Vec<String> = response.json().await?;
        Ok(names.into_iter().map(Pattern::from).collect())
    }

    async fn pattern_content(&self, name: &str) -> Result<String, ApiError> {
        let url = self.pattern_url(name)?;
        let response = check(self.http.get(url).send().await?).await?;
        Ok(response.text().await?)
    }

    async fn youtube_transcript(
        &self,
        request: &TranscriptRequest,
    ) -> Result<TranscriptResponse, ApiError> {
        let response = check(
            self.http
                .post(self.url("/youtube/transcript"))
                .json(request)
                .send()
                .await?,
        )
        .await?;
        Ok(response.json().await?)
    }

    async fn run_pattern(
        &self,
        request: &RunRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ApiError> {
        let response = check(self.http.post(self.url("/run")).json(request).send().await?).await?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(read_events(response, tx));
        Ok(rx)
    }
}

/// Split the SSE body into lines and forward each event. Stops after a
/// terminal event or once the receiver is gone, which drops the connection.
async fn read_events(mut response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let mut lines = LineBuffer::default();
    loop {
        let bytes = match response.chunk().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Stream error: {}", e);
                let _ = tx.send(StreamEvent::Error(format!("Stream error: {}", e))).await;
                return;
            }
        };

        let completed = match lines.push(&bytes) {
            Ok(completed) => completed,
            Err(e) => {
                tracing::error!("Stream error: {}", e);
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                return;
            }
        };
        for line in completed {
            let Some(event) = StreamEvent::parse_line(&line) else {
                continue;
            };
            let terminal = event.is_terminal();
            if tx.send(event).await.is_err() {
                tracing::debug!("Run receiver dropped, closing stream");
                return;
            }
            if terminal {
                return;
            }
        }
    }

    // A final frame without its trailing newline.
    if let Some(event) = lines.finish().as_deref().and_then(StreamEvent::parse_line) {
        let _ = tx.send(event).await;
    }
}
