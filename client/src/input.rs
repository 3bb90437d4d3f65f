use crate::api::CompanionApi;
use crate::error::{RunError, ValidationError};
use async_trait::async_trait;
use shared::models::TranscriptRequest;
use url::Url;

/// Where the text sent to a pattern comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    Text(String),
    Url(String),
    YouTube {
        url: String,
        include_timestamps: bool,
        /// Caption language code, English when unset.
        language: Option<String>,
    },
}

impl InputSource {
    /// What the user typed, before any fetching.
    pub fn raw(&self) -> &str {
        match self {
            InputSource::Text(text) => text,
            InputSource::Url(url) => url,
            InputSource::YouTube { url, .. } => url,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.raw().trim().is_empty()
    }
}

/// Turns a web page into readable text.
#[async_trait]
pub trait PageReader: Send + Sync {
    async fn read_page(&self, url: &Url) -> Result<String, RunError>;
}

/// Content-extraction proxy that takes the page URL appended to its base.
pub struct ReaderProxy {
    http: reqwest::Client,
    base: String,
}

impl ReaderProxy {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into(),
        }
    }
}

#[async_trait]
impl PageReader for ReaderProxy {
    async fn read_page(&self, url: &Url) -> Result<String, RunError> {
        let response = self
            .http
            .get(format!("{}{}", self.base, url))
            .send()
            .await
            .map_err(|e| RunError::Fetch(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RunError::Fetch(format!("HTTP {}", status)));
        }
        response
            .text()
            .await
            .map_err(|e| RunError::Fetch(e.without_url().to_string()))
    }
}

pub fn parse_page_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(ValidationError::InvalidUrl(trimmed.to_string())),
    }
}

/// Produce the payload for a run. Nothing is retried.
pub async fn resolve(
    source: &InputSource,
    reader: &dyn PageReader,
    api: &dyn CompanionApi,
) -> Result<String, RunError> {
    match source {
        InputSource::Text(text) => Ok(text.clone()),
        InputSource::Url(raw) => {
            let url = parse_page_url(raw)?;
            tracing::debug!(%url, "Fetching page through reader proxy");
            reader.read_page(&url).await
        }
        InputSource::YouTube {
            url,
            include_timestamps,
            language,
        } => {
            let request = TranscriptRequest {
                url: url.trim().to_string(),
                include_timestamps: *include_timestamps,
                language: language.clone(),
            };
            let envelope = api
                .youtube_transcript(&request)
                .await
                .map_err(|e| RunError::Transcript(e.message()))?;
            envelope.into_result().map_err(RunError::Transcript)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn only_absolute_web_urls_are_accepted() {
        assert!(parse_page_url(" https://example.com/post ").is_ok());
        assert_eq!(
            parse_page_url("example.com"),
            Err(ValidationError::InvalidUrl("example.com".into()))
        );
        assert!(parse_page_url("ftp://example.com/file").is_err());
    }

    #[tokio::test]
    async fn reader_proxy_prefixes_the_page_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/https:/+example\.com/post$"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Post\nBody"))
            .mount(&server)
            .await;

        let reader = ReaderProxy::new(format!("{}/", server.uri()));
        let url = parse_page_url("https://example.com/post").unwrap();
        assert_eq!(reader.read_page(&url).await.unwrap(), "# Post\nBody");
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let reader = ReaderProxy::new(format!("{}/", server.uri()));
        let url = parse_page_url("https://example.com/gone").unwrap();
        let err = reader.read_page(&url).await.unwrap_err();
        assert!(matches!(&err, RunError::Fetch(message) if message.contains("404")));
    }
}
