use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRequest {
    pub url: String,
    #[serde(rename = "includeTimestamps", default)]
    pub include_timestamps: bool,
    /// Caption language code; the helper defaults to English.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Either `transcript` (and usually `video_id`) or `error` is set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptResponse {
    pub fn ok(transcript: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            transcript: Some(transcript.into()),
            video_id: Some(video_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// An error field wins over any transcript that came with it.
    pub fn into_result(self) -> Result<String, String> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.transcript
            .ok_or_else(|| "Transcript response contained no transcript".to_string())
    }
}
