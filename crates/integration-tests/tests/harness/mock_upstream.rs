//! Mock chat-completions service for integration tests
//!
//! Answers every request with a fixed status and body, optionally after a
//! delay, and records what it received.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::{Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Running mock upstream
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
    hits: AtomicU32,
    last_request: Mutex<Option<Value>>,
    last_authorization: Mutex<Option<String>>,
}

/// Builder for a mock upstream's canned response
pub struct MockUpstreamBuilder {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

impl MockUpstream {
    /// Mock answering 200 with a standard chat completion
    pub async fn replying(content: &str) -> anyhow::Result<Self> {
        Self::builder().json(&completion(content)).start().await
    }

    pub fn builder() -> MockUpstreamBuilder {
        MockUpstreamBuilder {
            status: StatusCode::OK,
            body: completion("ok").to_string(),
            delay: None,
        }
    }

    /// Base URL to configure as `assistant.base_url`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of requests received
    pub fn hits(&self) -> u32 {
        self.state.hits.load(Ordering::Relaxed)
    }

    /// Body of the most recent request
    pub fn last_request(&self) -> Option<Value> {
        self.state.last_request.lock().unwrap().clone()
    }

    /// Authorization header of the most recent request
    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

impl MockUpstreamBuilder {
    pub fn status(mut self, status: u16) -> Self {
        self.status = StatusCode::from_u16(status).expect("valid status");
        self
    }

    pub fn json(mut self, body: &Value) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn raw(mut self, body: &str) -> Self {
        body.clone_into(&mut self.body);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn start(self) -> anyhow::Result<MockUpstream> {
        let state = Arc::new(MockState {
            status: self.status,
            body: self.body,
            delay: self.delay,
            hits: AtomicU32::new(0),
            last_request: Mutex::new(None),
            last_authorization: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_completion))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(MockUpstream { addr, shutdown, state })
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Standard chat-completion body carrying `content`
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

async fn handle_completion(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::Relaxed);
    *state.last_request.lock().unwrap() = serde_json::from_slice(&body).ok();
    *state.last_authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}
