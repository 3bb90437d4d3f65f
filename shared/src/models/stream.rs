use serde::{Deserialize, Serialize};
use thiserror::Error;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";
const ERROR_MARKER: &str = "[ERROR]";

/// One event on the run channel, in emission order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEvent {
    Chunk(String),
    Done,
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk(_))
    }

    /// Encode as one SSE frame (`data: ...` plus the blank separator line).
    ///
    /// Chunk text and error messages are JSON string literals so embedded
    /// newlines survive the line-based framing.
    pub fn to_frame(&self) -> String {
        match self {
            StreamEvent::Chunk(text) => format!("{DATA_PREFIX}{}\n\n", quote(text)),
            StreamEvent::Done => format!("{DATA_PREFIX}{DONE_MARKER}\n\n"),
            StreamEvent::Error(message) => {
                format!("{DATA_PREFIX}{ERROR_MARKER} {}\n\n", quote(message))
            }
        }
    }

    /// Decode a single line of an SSE body. Blank lines, comments and
    /// anything that is not a `data:` line yield `None`.
    pub fn parse_line(line: &str) -> Option<StreamEvent> {
        let line = line.trim_end_matches(['\n', '\r']);
        let data = line.strip_prefix(DATA_PREFIX)?;
        if data == DONE_MARKER {
            return Some(StreamEvent::Done);
        }
        if let Some(message) = data.strip_prefix(ERROR_MARKER) {
            return Some(StreamEvent::Error(unquote(message.trim_start())));
        }
        Some(StreamEvent::Chunk(unquote(data)))
    }
}

/// Longest unterminated line a [`LineBuffer`] will hold.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Stream line exceeded maximum size ({limit} bytes)")]
pub struct LineTooLong {
    pub limit: usize,
}

/// Reassembles newline-terminated lines from arbitrarily split network chunks.
#[derive(Debug)]
pub struct LineBuffer {
    buffer: Vec<u8>,
    limit: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
        }
    }

    /// Append bytes and return every line completed by them, without the
    /// trailing `\n` / `\r\n`. Fails once the unterminated remainder grows
    /// past the limit.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, LineTooLong> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..pos + 1).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        if self.buffer.len() > self.limit {
            self.buffer.clear();
            return Err(LineTooLong { limit: self.limit });
        }
        Ok(lines)
    }

    /// Whatever is left once the body ends without a final newline.
    pub fn finish(self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buffer)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        (!rest.is_empty()).then_some(rest)
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.replace('"', "\\\"")))
}

fn unquote(data: &str) -> String {
    serde_json::from_str::<String>(data).unwrap_or_else(|_| data.to_string())
}
