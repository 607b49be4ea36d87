//! Server-sent event parsing for streamed chat completions

use crate::error::{Result, ResumeTailorError};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::fmt::Display;
use std::pin::Pin;

/// Incremental text chunks; the consumer concatenates them
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Content(String),
    Done,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Parse one SSE line. Comments, blank lines and empty deltas yield `None`.
pub fn parse_sse_line(line: &str) -> Result<Option<SseEvent>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }

    let chunk: ChatStreamChunk = serde_json::from_str(data)
        .map_err(|e| ResumeTailorError::Upstream(format!("Malformed stream chunk: {}", e)))?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(SseEvent::Content))
}

/// Turn a raw byte stream into text chunks. A transport error ends the stream
/// with an `Upstream` item; nothing is resumed.
pub fn sse_text_stream<S, B, E>(chunks: S) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        let mut buffer: Vec<u8> = Vec::with_capacity(8192);

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    buffer.extend_from_slice(bytes.as_ref());

                    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                        let raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
                        let line = String::from_utf8_lossy(&raw).into_owned();

                        match parse_sse_line(&line) {
                            Ok(Some(SseEvent::Content(text))) => yield Ok(text),
                            Ok(Some(SseEvent::Done)) => return,
                            Ok(None) => {}
                            Err(e) => {
                                yield Err(e);
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(ResumeTailorError::Upstream(format!("Stream interrupted: {}", e)));
                    return;
                }
            }
        }

        // Final line without a trailing newline
        if !buffer.is_empty() {
            let line = String::from_utf8_lossy(&buffer).into_owned();
            match parse_sse_line(&line) {
                Ok(Some(SseEvent::Content(text))) => yield Ok(text),
                Ok(_) => {}
                Err(e) => yield Err(e),
            }
        }
    })
}

/// Drain a stream into one string, stopping at the first error
pub async fn collect_text(mut stream: TextStream) -> Result<String> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?);
    }
    Ok(text)
}
