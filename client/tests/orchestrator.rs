use async_trait::async_trait;
use client::store::{OutputBuffer, PatternAction, PatternStore};
use client::{
    ApiError, CompanionApi, InputSource, MemoryStorage, Orchestrator, PageReader, ReaderProxy,
    RunError, RunOutcome, ValidationError,
};
use shared::models::{
    AppSettings, Pattern, RunRequest, StreamEvent, TranscriptRequest, TranscriptResponse, Vendor,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scripted companion server that records what it was asked to do.
#[derive(Default)]
struct FakeCompanion {
    events: Vec<StreamEvent>,
    keep_open: bool,
    transcript: TranscriptResponse,
    runs: Mutex<Vec<RunRequest>>,
    transcripts: Mutex<Vec<TranscriptRequest>>,
    senders: Mutex<Vec<mpsc::Sender<StreamEvent>>>,
}

impl FakeCompanion {
    fn streaming(events: Vec<StreamEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

#[async_trait]
impl CompanionApi for FakeCompanion {
    async fn list_patterns(&self) -> Result<Vec<Pattern>, ApiError> {
        Ok(vec![Pattern::new("summarize")])
    }

    async fn pattern_content(&self, _name: &str) -> Result<String, ApiError> {
        Ok(String::new())
    }

    async fn youtube_transcript(
        &self,
        request: &TranscriptRequest,
    ) -> Result<TranscriptResponse, ApiError> {
        self.transcripts.lock().unwrap().push(request.clone());
        Ok(self.transcript.clone())
    }

    async fn run_pattern(
        &self,
        request: &RunRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ApiError> {
        self.runs.lock().unwrap().push(request.clone());
        let (tx, rx) = mpsc::channel(self.events.len().max(1));
        for event in &self.events {
            tx.try_send(event.clone()).unwrap();
        }
        if self.keep_open {
            self.senders.lock().unwrap().push(tx);
        }
        Ok(rx)
    }
}

/// Page reader that must never be reached.
#[derive(Default)]
struct CountingReader {
    calls: AtomicUsize,
}

#[async_trait]
impl PageReader for CountingReader {
    async fn read_page(&self, _url: &Url) -> Result<String, RunError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("page text".into())
    }
}

fn openai_settings() -> AppSettings {
    let mut settings = AppSettings {
        vendor: Vendor::OpenAi,
        model: Vendor::OpenAi.default_model().to_string(),
        ..AppSettings::default()
    };
    settings.credentials.insert(Vendor::OpenAi, "sk-test".into());
    settings
}

fn chunks(parts: &[&str]) -> Vec<StreamEvent> {
    parts
        .iter()
        .map(|p| StreamEvent::Chunk(p.to_string()))
        .chain([StreamEvent::Done])
        .collect()
}

#[tokio::test]
async fn text_run_streams_into_the_buffer() {
    let api = FakeCompanion::streaming(chunks(&["Hello", ", ", "summary"]));
    let reader = CountingReader::default();
    let orchestrator = Orchestrator::new(&api, &reader);
    let mut output = OutputBuffer::default();
    let mut printed = String::new();

    let outcome = orchestrator
        .run(
            &openai_settings(),
            Some("summarize"),
            &InputSource::Text("Hello world".into()),
            &mut output,
            &mut |chunk: &str| printed.push_str(chunk),
        )
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(output.text(), "Hello, summary");
    assert_eq!(printed, "Hello, summary");
    assert!(!output.is_streaming());
    assert_eq!(output.error(), None);

    let runs = api.runs.lock().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].vendor, Vendor::OpenAi);
    assert_eq!(runs[0].system_prompt, "summarize");
    assert_eq!(runs[0].user_input, "Hello world");
    assert_eq!(runs[0].api_key, "sk-test");
}

#[tokio::test]
async fn second_run_starts_from_an_empty_buffer() {
    let api = FakeCompanion::streaming(chunks(&["fresh"]));
    let reader = CountingReader::default();
    let orchestrator = Orchestrator::new(&api, &reader);
    let mut output = OutputBuffer::default();

    let failing = FakeCompanion::streaming(vec![
        StreamEvent::Chunk("old".into()),
        StreamEvent::Error("boom".into()),
    ]);
    let _ = Orchestrator::new(&failing, &reader)
        .run(
            &openai_settings(),
            Some("summarize"),
            &InputSource::Text("x".into()),
            &mut output,
            &mut |_: &str| {},
        )
        .await;
    assert_eq!(output.text(), "old");
    assert_eq!(output.error(), Some("boom"));

    orchestrator
        .run(
            &openai_settings(),
            Some("summarize"),
            &InputSource::Text("x".into()),
            &mut output,
            &mut |_: &str| {},
        )
        .await
        .unwrap();
    assert_eq!(output.text(), "fresh");
    assert_eq!(output.error(), None);
}

#[tokio::test]
async fn missing_pattern_never_touches_the_network() {
    let api = FakeCompanion::streaming(chunks(&["unused"]));
    let reader = CountingReader::default();
    let orchestrator = Orchestrator::new(&api, &reader);

    for source in [
        InputSource::Text("hello".into()),
        InputSource::Url("https://example.com".into()),
        InputSource::YouTube {
            url: "https://youtu.be/dQw4w9WgXcQ".into(),
            include_timestamps: false,
            language: None,
        },
    ] {
        let mut output = OutputBuffer::default();
        let err = orchestrator
            .run(&openai_settings(), None, &source, &mut output, &mut |_: &str| {})
            .await
            .unwrap_err();
        assert_eq!(err, RunError::Validation(ValidationError::NoPattern));
        assert!(!output.is_streaming());
    }
    assert_eq!(api.run_count(), 0);
    assert!(api.transcripts.lock().unwrap().is_empty());
    assert_eq!(reader.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_credential_fails_fast() {
    let api = FakeCompanion::streaming(chunks(&["unused"]));
    let reader = CountingReader::default();
    let mut settings = openai_settings();
    settings.credentials.clear();
    let mut output = OutputBuffer::default();

    let err = Orchestrator::new(&api, &reader)
        .run(
            &settings,
            Some("summarize"),
            &InputSource::Text("hi".into()),
            &mut output,
            &mut |_: &str| {},
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RunError::Validation(ValidationError::MissingCredential(Vendor::OpenAi))
    );
    assert_eq!(output.error(), Some("Please add your OpenAI API key in Settings."));
    assert_eq!(api.run_count(), 0);
}

#[tokio::test]
async fn failed_page_fetch_never_starts_a_run() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&proxy)
        .await;

    let api = FakeCompanion::streaming(chunks(&["unused"]));
    let reader = ReaderProxy::new(format!("{}/", proxy.uri()));
    let mut output = OutputBuffer::default();

    let err = Orchestrator::new(&api, &reader)
        .run(
            &openai_settings(),
            Some("summarize"),
            &InputSource::Url("https://example.com/article".into()),
            &mut output,
            &mut |_: &str| {},
        )
        .await
        .unwrap_err();

    assert!(matches!(&err, RunError::Fetch(message) if message.contains("502")));
    assert_eq!(api.run_count(), 0);
    assert!(!output.is_streaming());
    assert!(output.error().is_some());
}

#[tokio::test]
async fn page_text_becomes_the_payload() {
    let api = FakeCompanion::streaming(chunks(&["ok"]));
    let reader = CountingReader::default();
    let mut output = OutputBuffer::default();

    Orchestrator::new(&api, &reader)
        .run(
            &openai_settings(),
            Some("summarize"),
            &InputSource::Url(" https://example.com/article ".into()),
            &mut output,
            &mut |_: &str| {},
        )
        .await
        .unwrap();
    assert_eq!(api.runs.lock().unwrap()[0].user_input, "page text");
}

#[tokio::test]
async fn transcript_error_is_reported_verbatim() {
    let api = FakeCompanion {
        transcript: TranscriptResponse::failed("no captions"),
        ..FakeCompanion::streaming(chunks(&["unused"]))
    };
    let reader = CountingReader::default();
    let mut output = OutputBuffer::default();

    let err = Orchestrator::new(&api, &reader)
        .run(
            &openai_settings(),
            Some("summarize"),
            &InputSource::YouTube {
                url: "https://youtube.com/watch?v=abc".into(),
                include_timestamps: false,
                language: None,
            },
            &mut output,
            &mut |_: &str| {},
        )
        .await
        .unwrap_err();

    assert_eq!(err, RunError::Transcript("no captions".into()));
    assert_eq!(output.error(), Some("no captions"));
    assert_eq!(output.text(), "");
    assert!(!output.is_streaming());
    assert_eq!(api.run_count(), 0);

    let requests = api.transcripts.lock().unwrap();
    assert_eq!(requests[0].url, "https://youtube.com/watch?v=abc");
    assert!(!requests[0].include_timestamps);
}

#[tokio::test]
async fn transcript_text_is_sent_to_the_backend() {
    let api = FakeCompanion {
        transcript: TranscriptResponse::ok("The following is a transcript", "dQw4w9WgXcQ"),
        ..FakeCompanion::streaming(chunks(&["done"]))
    };
    let reader = CountingReader::default();
    let mut output = OutputBuffer::default();

    Orchestrator::new(&api, &reader)
        .run(
            &openai_settings(),
            Some("extract_wisdom"),
            &InputSource::YouTube {
                url: "https://youtu.be/dQw4w9WgXcQ".into(),
                include_timestamps: true,
                language: Some("de".into()),
            },
            &mut output,
            &mut |_: &str| {},
        )
        .await
        .unwrap();

    let transcripts = api.transcripts.lock().unwrap();
    assert!(transcripts[0].include_timestamps);
    assert_eq!(transcripts[0].language.as_deref(), Some("de"));
    let runs = api.runs.lock().unwrap();
    assert_eq!(runs[0].user_input, "The following is a transcript");
    assert_eq!(runs[0].system_prompt, "extract_wisdom");
}

#[tokio::test]
async fn cancel_stops_relaying_without_error() {
    let api = FakeCompanion {
        keep_open: true,
        ..FakeCompanion::streaming(vec![StreamEvent::Chunk("first".into())])
    };
    let reader = CountingReader::default();
    let orchestrator = Orchestrator::new(&api, &reader);
    let cancel = orchestrator.cancel_handle();
    let mut output = OutputBuffer::default();

    let outcome = orchestrator
        .run(
            &openai_settings(),
            Some("summarize"),
            &InputSource::Text("hi".into()),
            &mut output,
            &mut |_: &str| cancel.cancel(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert_eq!(output.text(), "first");
    assert!(!output.is_streaming());
    assert_eq!(output.error(), None);
    assert!(api.senders.lock().unwrap()[0].is_closed());
}

#[tokio::test]
async fn unavailable_catalog_falls_back_to_demo_patterns() {
    let mut store = PatternStore::load(MemoryStorage::default());
    let result = store.load_catalog(Err::<Vec<Pattern>, _>(ApiError::Status {
        status: 503,
        body: "Fabric patterns directory not found.".into(),
    }));
    assert!(result.is_err());
    assert_eq!(store.state().catalog.len(), 5);

    store
        .dispatch(PatternAction::Select("extract_wisdom".into()))
        .unwrap();
    assert_eq!(store.state().selected(), Some("extract_wisdom"));
}
