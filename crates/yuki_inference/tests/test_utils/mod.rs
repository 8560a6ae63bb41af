//! Test utilities for dispatcher tests.
//!
//! [`MockUpstream`] serves the inference server's endpoints on a random
//! local port. Each endpoint replays a scripted list of replies (the last
//! reply repeats) and counts how often it was hit.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use yuki_inference::{ApiMode, InferenceConfig, InferenceConfigBuilder};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with a JSON body
    Json(Value),
    /// Bare status with a short text body
    Status(u16),
    /// 429 with a `Retry-After` header
    RateLimited(String),
    /// 200 with newline-delimited lines
    Lines(Vec<String>),
    /// 200 streaming one record every few milliseconds, forever
    Endless,
}

/// Replies and hit count for one endpoint.
#[derive(Debug, Default)]
pub struct Script {
    replies: Vec<MockReply>,
    hits: AtomicUsize,
    bodies: Mutex<Vec<Value>>,
}

impl Script {
    fn new(replies: Vec<MockReply>) -> Arc<Self> {
        Arc::new(Self {
            replies,
            ..Self::default()
        })
    }

    fn next_reply(&self, body: Option<Value>) -> Option<MockReply> {
        let hit = self.hits.fetch_add(1, Ordering::SeqCst);
        if let Some(body) = body {
            self.bodies.lock().unwrap().push(body);
        }
        let last = self.replies.len().checked_sub(1)?;
        Some(self.replies[hit.min(last)].clone())
    }

    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// JSON bodies received so far.
    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct MockState {
    generate: Arc<Script>,
    chat: Arc<Script>,
    tags: Arc<Script>,
    stream_closed: Arc<AtomicBool>,
}

/// In-process stand-in for the inference server.
pub struct MockUpstream {
    /// Bound address
    pub addr: SocketAddr,
    /// `/api/generate` script
    pub generate: Arc<Script>,
    /// `/api/chat` script
    pub chat: Arc<Script>,
    /// `/api/tags` script
    pub tags: Arc<Script>,
    stream_closed: Arc<AtomicBool>,
}

impl MockUpstream {
    /// Start a server with the given scripts. An empty script answers 404.
    pub async fn start(
        generate: Vec<MockReply>,
        chat: Vec<MockReply>,
        tags: Vec<MockReply>,
    ) -> anyhow::Result<Self> {
        let state = MockState {
            generate: Script::new(generate),
            chat: Script::new(chat),
            tags: Script::new(tags),
            stream_closed: Arc::new(AtomicBool::new(false)),
        };

        let app = Router::new()
            .route("/api/generate", post(generate_handler))
            .route("/api/chat", post(chat_handler))
            .route("/api/tags", get(tags_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            generate: state.generate,
            chat: state.chat,
            tags: state.tags,
            stream_closed: state.stream_closed,
        })
    }

    /// Base URL for client configuration.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this server.
    pub fn config(&self, api_mode: ApiMode, attempts: u32) -> InferenceConfig {
        InferenceConfigBuilder::default()
            .base_url(self.base_url())
            .model("test-model")
            .api_mode(api_mode)
            .timeout_secs(5.0)
            .retry_max_attempts(attempts)
            .retry_backoff_base(0.01)
            .build()
            .unwrap()
    }

    /// Wait until an endless stream notices its reader went away.
    pub async fn wait_for_stream_close(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.stream_closed.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

/// Newline-delimited generate records for `parts`, then a done record.
pub fn generate_lines(parts: &[&str]) -> Vec<String> {
    let mut lines: Vec<String> = parts
        .iter()
        .map(|p| serde_json::json!({"response": p, "done": false}).to_string())
        .collect();
    lines.push(serde_json::json!({"response": "", "done": true}).to_string());
    lines
}

/// Newline-delimited chat records for `parts`, then a done record.
pub fn chat_lines(parts: &[&str]) -> Vec<String> {
    let mut lines: Vec<String> = parts
        .iter()
        .map(|p| {
            serde_json::json!({"message": {"role": "assistant", "content": p}, "done": false})
                .to_string()
        })
        .collect();
    lines.push(serde_json::json!({"done": true}).to_string());
    lines
}

async fn generate_handler(State(state): State<MockState>, body: axum::Json<Value>) -> Response {
    let reply = state.generate.next_reply(Some(body.0));
    respond(reply, &state.stream_closed)
}

async fn chat_handler(State(state): State<MockState>, body: axum::Json<Value>) -> Response {
    let reply = state.chat.next_reply(Some(body.0));
    respond(reply, &state.stream_closed)
}

async fn tags_handler(State(state): State<MockState>) -> Response {
    let reply = state.tags.next_reply(None);
    respond(reply, &state.stream_closed)
}

fn respond(reply: Option<MockReply>, stream_closed: &Arc<AtomicBool>) -> Response {
    match reply {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(MockReply::Json(value)) => axum::Json(value).into_response(),
        Some(MockReply::Status(code)) => {
            let status = StatusCode::from_u16(code).unwrap();
            (status, "mock failure").into_response()
        }
        Some(MockReply::RateLimited(retry_after)) => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after)],
            "slow down",
        )
            .into_response(),
        Some(MockReply::Lines(lines)) => {
            let mut body = lines.join("\n");
            body.push('\n');
            Response::new(Body::from(body))
        }
        Some(MockReply::Endless) => {
            let (tx, rx) = tokio::sync::mpsc::channel::<Result<String, std::io::Error>>(1);
            let closed = Arc::clone(stream_closed);
            tokio::spawn(async move {
                let line = format!("{}\n", serde_json::json!({"response": "tick", "done": false}));
                while tx.send(Ok(line.clone())).await.is_ok() {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                closed.store(true, Ordering::SeqCst);
            });
            Response::new(Body::from_stream(ReceiverStream::new(rx)))
        }
    }
}
