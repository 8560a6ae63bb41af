//! Relay of newline-delimited JSON streams into text fragments.

use crate::Endpoint;
use crate::response::reported_error;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use yuki_error::{GatewayError, GatewayErrorKind};

/// Longest partial line held while waiting for its newline.
pub(crate) const MAX_LINE_BYTES: usize = 1024 * 1024;

type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send>>;

/// What one stream record contributed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Record {
    pub(crate) delta: Option<String>,
    pub(crate) done: bool,
}

/// Interpret one line of a streamed response.
///
/// Returns `Ok(None)` for blank lines. A record with an error field or a line
/// that is not JSON fails the stream.
pub(crate) fn parse_line(endpoint: Endpoint, line: &[u8]) -> Result<Option<Record>, GatewayErrorKind> {
    let line = std::str::from_utf8(line)
        .map_err(|e| GatewayErrorKind::MalformedResponse(format!("stream line is not UTF-8: {}", e)))?
        .trim();
    if line.is_empty() {
        return Ok(None);
    }

    let record: Value = serde_json::from_str(line).map_err(|e| {
        GatewayErrorKind::MalformedResponse(format!("unparseable stream line: {}", e))
    })?;

    if let Some(message) = reported_error(&record) {
        return Err(GatewayErrorKind::UpstreamReported(message));
    }

    let delta = endpoint
        .text_field(&record)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    let done = record.get("done").and_then(Value::as_bool) == Some(true);
    Ok(Some(Record { delta, done }))
}

/// Turn a body of byte chunks into a sequence of text fragments.
///
/// Lines may span chunk boundaries. The sequence ends after the record that
/// carries `done: true`. Any failure is yielded once and ends the sequence:
/// an upstream error record, an unparseable line, a read error, a read that
/// stalls longer than `read_timeout`, a line longer than [`MAX_LINE_BYTES`],
/// or the body closing before the completion record.
pub(crate) fn relay<S, B, E>(
    endpoint: Endpoint,
    body: S,
    read_timeout: Duration,
) -> impl Stream<Item = Result<String, GatewayError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    async_stream::stream! {
        let mut body = Box::pin(body);
        let mut buffer: Vec<u8> = Vec::new();
        let mut eof = false;

        loop {
            if !eof {
                match tokio::time::timeout(read_timeout, body.next()).await {
                    Err(_) => {
                        yield Err(GatewayError::new(GatewayErrorKind::Stream(format!(
                            "no data from {} for {:?}",
                            endpoint.path(),
                            read_timeout
                        ))));
                        return;
                    }
                    Ok(Some(Err(e))) => {
                        yield Err(GatewayError::new(GatewayErrorKind::Stream(format!(
                            "reading {} failed: {}",
                            endpoint.path(),
                            e
                        ))));
                        return;
                    }
                    Ok(Some(Ok(chunk))) => buffer.extend_from_slice(chunk.as_ref()),
                    Ok(None) => {
                        eof = true;
                        if !buffer.is_empty() {
                            buffer.push(b'\n');
                        }
                    }
                }
            }

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                match parse_line(endpoint, &line) {
                    Ok(None) => {}
                    Ok(Some(record)) => {
                        if let Some(delta) = record.delta {
                            yield Ok(delta);
                        }
                        if record.done {
                            return;
                        }
                    }
                    Err(kind) => {
                        yield Err(GatewayError::new(kind));
                        return;
                    }
                }
            }

            if buffer.len() > MAX_LINE_BYTES {
                yield Err(GatewayError::new(GatewayErrorKind::MalformedResponse(format!(
                    "stream line from {} exceeds {} bytes",
                    endpoint.path(),
                    MAX_LINE_BYTES
                ))));
                return;
            }

            if eof {
                yield Err(GatewayError::new(GatewayErrorKind::Stream(format!(
                    "{} closed the stream before completion",
                    endpoint.path()
                ))));
                return;
            }
        }
    }
}

/// A cancellable sequence of text fragments from one streamed completion.
///
/// Owns the upstream connection. Dropping the stream (or calling
/// [`close`](TokenStream::close)) at any point releases the connection, so
/// a consumer whose client went away just stops polling and lets it go.
///
/// No fallback or retry happens once a `TokenStream` exists; a failure ends
/// the sequence after being yielded.
pub struct TokenStream {
    inner: FragmentStream,
    endpoint: Endpoint,
    delivered_chars: usize,
    finished: bool,
}

impl TokenStream {
    pub(crate) fn new(
        endpoint: Endpoint,
        inner: impl Stream<Item = Result<String, GatewayError>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(inner),
            endpoint,
            delivered_chars: 0,
            finished: false,
        }
    }

    /// Endpoint serving this stream.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Characters yielded so far.
    pub fn delivered_chars(&self) -> usize {
        self.delivered_chars
    }

    /// True once the sequence has ended, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stop consuming and release the upstream connection.
    pub fn close(self) {
        drop(self);
    }

    /// Drain the stream into one string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream")
            .field("endpoint", &self.endpoint)
            .field("delivered_chars", &self.delivered_chars)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Stream for TokenStream {
    type Item = Result<String, GatewayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(fragment))) => {
                this.delivered_chars += fragment.chars().count();
                Poll::Ready(Some(Ok(fragment)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.finished = true;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for TokenStream {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                endpoint = %self.endpoint,
                delivered_chars = self.delivered_chars,
                "Token stream abandoned, closing upstream connection"
            );
        }
    }
}
