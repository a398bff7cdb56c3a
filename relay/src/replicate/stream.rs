//! Prediction output stream.

use std::collections::VecDeque;
use std::io;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;

use super::{ReplicateError, Result, SseDecoder, SseEvent};

/// Text chunks produced by one prediction, in arrival order.
///
/// Wraps the raw event-stream bytes. `output` events yield chunks, `done`
/// ends the stream and `error` ends it with a failure. The stream is finite
/// and cannot be restarted; dropping it closes the upstream connection.
pub struct TokenStream {
    prediction_id: String,
    bytes: BoxStream<'static, Result<Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    upstream_done: bool,
    finished: bool,
}

#[derive(Debug, Deserialize)]
struct StreamErrorPayload {
    #[serde(default)]
    detail: Option<String>,
}

impl TokenStream {
    pub fn new<S>(prediction_id: impl Into<String>, bytes: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            prediction_id: prediction_id.into(),
            bytes: bytes.boxed(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            upstream_done: false,
            finished: false,
        }
    }

    /// Next text chunk, `Ok(None)` at the end of the output.
    ///
    /// Once this returns `Ok(None)` or an error, every later call returns
    /// `Ok(None)`.
    pub async fn next_chunk(&mut self) -> Result<Option<String>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            while let Some(event) = self.pending.pop_front() {
                match event.event.as_str() {
                    "output" => return Ok(Some(event.data)),
                    "done" => {
                        self.finished = true;
                        return Ok(None);
                    }
                    "error" => {
                        self.finished = true;
                        return Err(ReplicateError::Stream(error_message(&event.data)));
                    }
                    other => {
                        tracing::trace!(event = other, "Ignoring prediction stream event");
                    }
                }
            }

            if self.upstream_done {
                self.finished = true;
                return Ok(None);
            }

            match self.bytes.next().await {
                Some(Ok(chunk)) => match self.decoder.feed(&chunk) {
                    Ok(events) => self.pending.extend(events),
                    Err(e) => {
                        self.finished = true;
                        return Err(e);
                    }
                },
                Some(Err(e)) => {
                    self.finished = true;
                    return Err(e);
                }
                None => {
                    self.upstream_done = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }

    /// Adapt into a response body stream.
    ///
    /// A failure is yielded once as an I/O error, which aborts the chunked
    /// response so the caller sees a truncated transfer instead of a clean
    /// end.
    pub fn into_body_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        stream::unfold(self, |mut tokens| async move {
            match tokens.next_chunk().await {
                Ok(Some(chunk)) => Some((Ok(Bytes::from(chunk)), tokens)),
                Ok(None) => {
                    tracing::debug!(prediction_id = %tokens.prediction_id, "Prediction stream finished");
                    None
                }
                Err(e) => {
                    tracing::warn!(
                        prediction_id = %tokens.prediction_id,
                        error = %e,
                        "Prediction stream failed after response started"
                    );
                    Some((Err(io::Error::other(e)), tokens))
                }
            }
        })
    }
}

fn error_message(data: &str) -> String {
    serde_json::from_str::<StreamErrorPayload>(data)
        .ok()
        .and_then(|payload| payload.detail)
        .unwrap_or_else(|| data.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_stream(chunks: Vec<&'static str>) -> TokenStream {
        let bytes = stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes()))),
        );
        TokenStream::new("p1", bytes)
    }

    async fn collect(mut tokens: TokenStream) -> Result<Vec<String>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = tokens.next_chunk().await? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    #[tokio::test]
    async fn test_output_events_in_order() {
        let tokens = token_stream(vec![
            "event: output\ndata: Hel\n\n",
            "event: output\ndata: lo\n\n",
            "event: done\ndata: {}\n\n",
        ]);
        assert_eq!(collect(tokens).await.unwrap(), vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn test_done_stops_reading() {
        let tokens = token_stream(vec![
            "event: output\ndata: a\n\nevent: done\ndata: {}\n\n",
            "event: output\ndata: ignored\n\n",
        ]);
        assert_eq!(collect(tokens).await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_end_of_bytes_without_done() {
        let tokens = token_stream(vec!["event: output\ndata: a\n\nevent: output\ndata: b"]);
        assert_eq!(collect(tokens).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_error_event_uses_detail() {
        let mut tokens = token_stream(vec![
            "event: output\ndata: partial\n\n",
            "event: error\ndata: {\"detail\": \"CUDA out of memory\"}\n\n",
        ]);

        assert_eq!(tokens.next_chunk().await.unwrap().as_deref(), Some("partial"));
        let err = tokens.next_chunk().await.unwrap_err();
        assert_eq!(err.to_string(), "Prediction stream failed: CUDA out of memory");
        assert!(tokens.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let bytes = stream::iter(vec![
            Ok(Bytes::from_static(b"event: output\ndata: x\n\n")),
            Err(ReplicateError::Stream("connection reset".to_string())),
        ]);
        let mut tokens = TokenStream::new("p2", bytes);

        assert_eq!(tokens.next_chunk().await.unwrap().as_deref(), Some("x"));
        assert!(tokens.next_chunk().await.is_err());
        assert!(tokens.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_body_stream_yields_error_once() {
        let tokens = token_stream(vec![
            "event: output\ndata: ok\n\n",
            "event: error\ndata: boom\n\n",
        ]);

        let items: Vec<io::Result<Bytes>> = tokens.into_body_stream().collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), &Bytes::from_static(b"ok"));
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_chunks_relayed_before_upstream_ends() {
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes>>(4);
        let bytes = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        let mut body = Box::pin(TokenStream::new("p3", bytes).into_body_stream());

        tx.send(Ok(Bytes::from_static(b"event: output\ndata: Hel\n\n")))
            .await
            .unwrap();
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(first, Bytes::from_static(b"Hel"));
        assert!(!tx.is_closed());

        tx.send(Ok(Bytes::from_static(b"event: output\ndata: lo\n\n")))
            .await
            .unwrap();
        let second = body.next().await.unwrap().unwrap();
        assert_eq!(second, Bytes::from_static(b"lo"));
    }

    #[tokio::test]
    async fn test_dropping_body_releases_upstream() {
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes>>(4);
        let bytes = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        let mut body = Box::pin(TokenStream::new("p4", bytes).into_body_stream());

        tx.send(Ok(Bytes::from_static(b"event: output\ndata: Hel\n\n")))
            .await
            .unwrap();
        assert!(body.next().await.unwrap().is_ok());

        drop(body);
        assert!(tx.is_closed());
        assert!(tx.send(Ok(Bytes::new())).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_line_fails_stream() {
        let line = vec![b'x'; 2 * 1024 * 1024];
        let bytes = stream::iter(vec![Ok(Bytes::from(line))]);
        let mut tokens = TokenStream::new("p5", bytes);

        let err = tokens.next_chunk().await.unwrap_err();
        assert!(matches!(err, ReplicateError::Stream(_)));
        assert!(tokens.next_chunk().await.unwrap().is_none());
    }
}
