use crate::config::HelperCommand;
use regex::Regex;
use shared::models::{TranscriptRequest, TranscriptResponse};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use thiserror::Error;
use tokio::process::Command;

const MAX_TRANSCRIPT_CHARS: usize = 30_000;

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid regex"));
static URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/|youtube\.com/live/)([a-zA-Z0-9_-]{11})",
    )
    .expect("valid regex")
});
static QUERY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]v=([a-zA-Z0-9_-]{11})").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Invalid YouTube URL or ID: {0}")]
    InvalidUrl(String),
    #[error("Transcript helper is not executable: {0}")]
    HelperMissing(String),
    #[error("YouTube transcript script not found: {}", .0.display())]
    ScriptMissing(PathBuf),
    #[error("Failed to start transcript helper: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Transcript helper returned malformed output: {0}")]
    Malformed(String),
    #[error("{0}")]
    Reported(String),
    #[error("The transcript is empty or could not be parsed.")]
    Empty,
}

/// Accepts watch/short/embed/shorts/live URLs or a bare 11 character id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }
    [&*URL_ID, &*QUERY_ID]
        .into_iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}

/// Drop caption noise. Without timestamps the text becomes one paragraph.
pub fn clean_transcript(raw: &str, include_timestamps: bool) -> String {
    let text = raw.replace("[Music]", "").replace("[Applause]", "");
    if include_timestamps {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        WHITESPACE.replace_all(&text, " ").trim().to_string()
    }
}

pub fn format_for_ai(transcript: &str, video_url: &str) -> String {
    let body = if transcript.chars().count() > MAX_TRANSCRIPT_CHARS {
        let truncated: String = transcript.chars().take(MAX_TRANSCRIPT_CHARS).collect();
        format!("{truncated}\n\n[Transcript truncated due to length...]")
    } else {
        transcript.to_string()
    };

    format!(
        "The following is a transcript from a YouTube video:\nURL: {video_url}\n\n---\nTRANSCRIPT:\n{body}\n---\n\nPlease analyze this transcript according to the pattern instructions."
    )
}

/// Runs the external transcript helper and shapes its output for a model.
pub struct TranscriptExtractor {
    helper: HelperCommand,
}

impl TranscriptExtractor {
    pub fn new(helper: HelperCommand) -> Self {
        Self { helper }
    }

    pub async fn extract(
        &self,
        request: &TranscriptRequest,
    ) -> Result<TranscriptResponse, TranscriptError> {
        let video_id = extract_video_id(&request.url)
            .ok_or_else(|| TranscriptError::InvalidUrl(request.url.trim().to_string()))?;
        let raw = self.run_helper(request).await?;

        let transcript = clean_transcript(&raw, request.include_timestamps);
        if transcript.is_empty() {
            return Err(TranscriptError::Empty);
        }
        let video_url = format!("https://www.youtube.com/watch?v={video_id}");
        tracing::info!(%video_id, chars = transcript.len(), "Fetched transcript");
        Ok(TranscriptResponse::ok(
            format_for_ai(&transcript, &video_url),
            video_id,
        ))
    }

    async fn run_helper(&self, request: &TranscriptRequest) -> Result<String, TranscriptError> {
        let program = &self.helper.program;
        if Path::new(program).components().count() > 1 && !is_executable::is_executable(program) {
            return Err(TranscriptError::HelperMissing(program.clone()));
        }
        if let Some(script) = self.helper.script()
            && !script.is_file()
        {
            return Err(TranscriptError::ScriptMissing(script.to_path_buf()));
        }

        let mut command = Command::new(program);
        command
            .args(&self.helper.args)
            .arg("--url")
            .arg(request.url.trim())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if request.include_timestamps {
            command.arg("--timestamps");
        }
        if let Some(language) = request.language.as_deref().map(str::trim)
            && !language.is_empty()
        {
            command.arg("--lang").arg(language);
        }

        tracing::debug!(%program, "Spawning transcript helper");
        let output = command.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        // The helper reports its own failures as an envelope, even on a non-zero exit.
        match serde_json::from_str::<TranscriptResponse>(stdout.trim()) {
            Ok(envelope) => envelope.into_result().map_err(TranscriptError::Reported),
            Err(e) if output.status.success() => Err(TranscriptError::Malformed(e.to_string())),
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let message = if stderr.is_empty() {
                    format!("Transcript helper exited with {}", output.status)
                } else {
                    stderr
                };
                Err(TranscriptError::Reported(message))
            }
        }
    }
}
