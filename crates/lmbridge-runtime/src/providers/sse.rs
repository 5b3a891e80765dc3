//! Server-Sent Events decoding for OpenAI-style streaming responses.
//!
//! Upstream format: `data: {"choices":[{"delta":{"content":"hi"}}]}\n\n`,
//! terminated by `data: [DONE]`.

use std::fmt::Display;

use bytes::{Bytes, BytesMut};
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use lmbridge_core::UpstreamError;
use serde_json::Value;
use tracing::warn;

/// State threaded through the `unfold` stream.
struct SseState<E> {
    stream: BoxStream<'static, Result<Bytes, E>>,
    buf: BytesMut,
    done: bool,
}

/// What a single SSE line contributes.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Fragment(String),
    Done,
    Skip,
}

/// Turn an SSE byte stream into the sequence of non-empty content deltas.
pub(crate) fn content_fragments<S, E>(
    byte_stream: S,
) -> impl Stream<Item = Result<String, UpstreamError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = SseState {
        stream: byte_stream.boxed(),
        buf: BytesMut::new(),
        done: false,
    };

    futures_util::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            if let Some(line_end) = find_newline(&st.buf) {
                let line = st.buf.split_to(line_end);
                match parse_line(&String::from_utf8_lossy(&line)) {
                    Ok(Line::Fragment(text)) => return Some((Ok(text), st)),
                    Ok(Line::Done) => {
                        st.done = true;
                        return None;
                    }
                    Ok(Line::Skip) => continue,
                    Err(e) => {
                        st.done = true;
                        return Some((Err(e), st));
                    }
                }
            }

            match st.stream.next().await {
                Some(Ok(chunk)) => st.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    warn!("Upstream stream error: {e}");
                    st.done = true;
                    return Some((Err(UpstreamError::Transport(e.to_string())), st));
                }
                None => {
                    // Last line may lack a trailing newline.
                    st.done = true;
                    let rest = st.buf.split();
                    return match parse_line(&String::from_utf8_lossy(&rest)) {
                        Ok(Line::Fragment(text)) => Some((Ok(text), st)),
                        Ok(Line::Done | Line::Skip) => None,
                        Err(e) => Some((Err(e), st)),
                    };
                }
            }
        }
    })
}

fn find_newline(buf: &BytesMut) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}

fn parse_line(raw: &str) -> Result<Line, UpstreamError> {
    let trimmed = raw.trim();

    // Blank separators and `:` comments
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return Ok(Line::Skip);
    }

    // `event:`, `id:` and `retry:` fields carry nothing we use
    let Some(data) = trimmed.strip_prefix("data:") else {
        return Ok(Line::Skip);
    };
    let data = data.trim();

    if data == "[DONE]" {
        return Ok(Line::Done);
    }

    let chunk: Value = serde_json::from_str(data)
        .map_err(|e| UpstreamError::Protocol(format!("invalid stream chunk: {e}")))?;

    if let Some(error) = inline_error(&chunk) {
        return Err(error);
    }

    match chunk["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => Ok(Line::Fragment(content.to_string())),
        _ => Ok(Line::Skip),
    }
}

/// Decode a non-streamed `chat.completion` body into its reply text.
///
/// Used when the upstream ignores `stream: true` and answers with plain JSON.
pub(crate) fn completion_content(body: &[u8]) -> Result<String, UpstreamError> {
    let completion: Value = serde_json::from_slice(body)
        .map_err(|e| UpstreamError::Protocol(format!("invalid completion body: {e}")))?;

    if let Some(error) = inline_error(&completion) {
        return Err(error);
    }

    completion["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| UpstreamError::Protocol("completion body has no message content".to_string()))
}

fn inline_error(payload: &Value) -> Option<UpstreamError> {
    let error = payload.get("error")?;
    let message = error["message"]
        .as_str()
        .map_or_else(|| error.to_string(), str::to_string);
    Some(UpstreamError::Other(message))
}
