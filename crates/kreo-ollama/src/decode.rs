//! JSON-lines decoding of streamed chat replies.

use futures_util::{stream, Stream, StreamExt};
use std::collections::VecDeque;
use tracing::warn;

use crate::error::OllamaError;
use crate::gateway::DeltaStream;
use crate::wire::ChatChunk;

/// One decoded line of a streamed reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Delta(String),
    Done,
    Error(String),
}

/// Incremental splitter for newline-delimited JSON.
///
/// Bytes are buffered until a full line is available so multi-byte UTF-8
/// sequences and JSON objects split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Feed raw bytes, returning every complete line decoded so far.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Decoded> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(decoded) = decode_line(&line) {
                out.push(decoded);
            }
        }
        out
    }

    /// Decode a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<Decoded> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Option<Decoded> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<ChatChunk>(text) {
        Ok(chunk) => {
            if let Some(error) = chunk.error {
                Some(Decoded::Error(error))
            } else if chunk.done {
                Some(Decoded::Done)
            } else {
                chunk
                    .message
                    .map(|m| m.content)
                    .filter(|c| !c.is_empty())
                    .map(Decoded::Delta)
            }
        }
        Err(e) => {
            warn!(error = %e, line = %text, "dropping malformed stream chunk");
            None
        }
    }
}

struct StreamState<S> {
    bytes: S,
    decoder: LineDecoder,
    pending: VecDeque<Result<String, OllamaError>>,
    finished: bool,
}

impl<S> StreamState<S> {
    /// Queue decoded lines; returns `true` once the reply has ended.
    fn absorb(&mut self, decoded: impl IntoIterator<Item = Decoded>) -> bool {
        for item in decoded {
            match item {
                Decoded::Delta(text) => self.pending.push_back(Ok(text)),
                Decoded::Done => return true,
                Decoded::Error(msg) => {
                    self.pending.push_back(Err(OllamaError::Api(msg)));
                    return true;
                }
            }
        }
        false
    }
}

/// Turn a body byte stream into a stream of content deltas.
///
/// The stream ends at the first `done: true` line, at an in-band error, or
/// when the body ends.
pub fn delta_stream<S, B>(bytes: S) -> DeltaStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin + Send + 'static,
    B: AsRef<[u8]>,
{
    let state = StreamState {
        bytes,
        decoder: LineDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    let deltas = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let decoded = state.decoder.push(chunk.as_ref());
                    state.finished = state.absorb(decoded);
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(OllamaError::Http(e)));
                    state.finished = true;
                }
                None => {
                    let tail = state.decoder.finish();
                    state.absorb(tail);
                    state.finished = true;
                }
            }
        }
    });

    Box::pin(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, reqwest::Error>> + Unpin {
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(chunks)
    }

    #[test]
    fn test_split_across_chunks() {
        let mut decoder = LineDecoder::default();
        assert!(decoder.push(br#"{"message":{"content":"Hel"#).is_empty());
        let out = decoder.push(b"lo\"},\"done\":false}\n{\"done\":true}\n");
        assert_eq!(out, vec![Decoded::Delta("Hello".into()), Decoded::Done]);
    }

    #[test]
    fn test_malformed_line_dropped() {
        let mut decoder = LineDecoder::default();
        let out = decoder.push(b"garbage\n{\"message\":{\"content\":\"ok\"},\"done\":false}\n");
        assert_eq!(out, vec![Decoded::Delta("ok".into())]);
    }

    #[test]
    fn test_in_band_error() {
        let mut decoder = LineDecoder::default();
        let out = decoder.push(b"{\"error\":\"model not found\"}\n");
        assert_eq!(out, vec![Decoded::Error("model not found".into())]);
    }

    #[tokio::test]
    async fn test_delta_stream_stops_at_done() {
        let stream = delta_stream(body(&[
            "{\"message\":{\"content\":\"a\"},\"done\":false}\n{\"message\":{\"content\":\"b\"},",
            "\"done\":false}\n{\"done\":true}\n{\"message\":{\"content\":\"late\"},\"done\":false}\n",
        ]));
        let deltas: Vec<String> = stream.map(|d| d.unwrap()).collect().await;
        assert_eq!(deltas, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_delta_stream_unterminated_tail() {
        let stream = delta_stream(body(&["{\"message\":{\"content\":\"tail\"},\"done\":false}"]));
        let deltas: Vec<String> = stream.map(|d| d.unwrap()).collect().await;
        assert_eq!(deltas, vec!["tail"]);
    }

    #[tokio::test]
    async fn test_delta_stream_error_after_deltas() {
        let mut stream = delta_stream(body(&[
            "{\"message\":{\"content\":\"x\"},\"done\":false}\n{\"error\":\"boom\"}\n",
        ]));
        assert_eq!(stream.next().await.unwrap().unwrap(), "x");
        assert!(matches!(stream.next().await, Some(Err(OllamaError::Api(_)))));
        assert!(stream.next().await.is_none());
    }
}
