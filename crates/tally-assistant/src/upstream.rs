//! Transport to the upstream chat-completions service

use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, StatusCode, header};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tally_config::AssistantConfig;
use url::Url;

use crate::error::AssistantError;
use crate::normalize::truncate_chars;
use crate::protocol::UpstreamRequest;

/// Characters of a failed upstream body written to logs
const LOGGED_BODY_CHARS: usize = 200;

/// Raw upstream answer, before normalization
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// A chat-completions endpoint
///
/// Implementations send exactly one request per call and never retry.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Human-readable upstream name for logs
    fn name(&self) -> &str;

    /// Send a request and return the raw status and body
    async fn send(&self, request: &UpstreamRequest) -> Result<RawResponse, AssistantError>;
}

/// HTTP upstream speaking the `OpenAI`-compatible chat-completions protocol
pub struct HttpUpstream {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl HttpUpstream {
    /// Create an upstream for `base_url`, appending `/chat/completions`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: &Url, api_key: Option<SecretString>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build upstream HTTP client: {e}"))?;

        let base = base_url.as_str().trim_end_matches('/');

        Ok(Self {
            client,
            endpoint: format!("{base}/chat/completions"),
            api_key,
            timeout,
        })
    }

    /// Create from assistant configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is invalid or the client cannot be built
    pub fn from_config(config: &AssistantConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.base_url,
            config.credential().cloned(),
            config.timeout_duration()?,
        )
    }

    /// Full chat-completions URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(
        &self,
        api_key: &SecretString,
        request: &UpstreamRequest,
    ) -> reqwest::Result<(StatusCode, HeaderMap, String)> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok((status, headers, body))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &UpstreamRequest) -> Result<RawResponse, AssistantError> {
        let Some(api_key) = &self.api_key else {
            tracing::error!("upstream credential is not configured, request not sent");
            return Err(AssistantError::Config);
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            messages = request.messages.len(),
            "sending upstream request"
        );

        // Dropping the exchange future on expiry aborts the in-flight call
        let (status, headers, body) = match tokio::time::timeout(self.timeout, self.exchange(api_key, request)).await {
            Err(_elapsed) => {
                tracing::warn!(endpoint = %self.endpoint, timeout_ms = self.timeout.as_millis(), "upstream request timed out");
                return Err(AssistantError::Timeout(self.timeout));
            }
            Ok(Err(e)) => return Err(self.classify(&e)),
            Ok(Ok(exchange)) => exchange,
        };

        if !status.is_success() {
            tracing::warn!(
                endpoint = %self.endpoint,
                %status,
                content_type = header_str(&headers, header::CONTENT_TYPE.as_str()),
                request_id = header_str(&headers, "x-request-id"),
                body = %truncate_chars(&body, LOGGED_BODY_CHARS),
                "upstream returned error status"
            );
        }

        Ok(RawResponse { status, body })
    }
}

impl HttpUpstream {
    fn classify(&self, error: &reqwest::Error) -> AssistantError {
        if error.is_timeout() {
            tracing::warn!(endpoint = %self.endpoint, error = %error, "upstream request timed out");
            return AssistantError::Timeout(self.timeout);
        }

        tracing::error!(
            endpoint = %self.endpoint,
            error = %error,
            connect = error.is_connect(),
            "upstream request failed"
        );
        AssistantError::Network(error.to_string())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;
    use crate::types::ChatMessage;

    fn request() -> UpstreamRequest {
        UpstreamRequest {
            model: "qwen-turbo".to_owned(),
            messages: vec![ChatMessage::user("1+1?").into()],
            temperature: Some(0.7),
            max_tokens: Some(100),
            stream: Some(false),
        }
    }

    fn upstream(addr: std::net::SocketAddr, api_key: Option<&str>, timeout: Duration) -> HttpUpstream {
        let base_url = Url::parse(&format!("http://{addr}/v1")).unwrap();
        HttpUpstream::new(&base_url, api_key.map(SecretString::from), timeout).unwrap()
    }

    #[test]
    fn endpoint_appends_path() {
        let base_url = Url::parse("https://api.qwen.ai/v1/").unwrap();
        let upstream = HttpUpstream::new(&base_url, None, Duration::from_secs(1)).unwrap();
        assert_eq!(upstream.endpoint(), "https://api.qwen.ai/v1/chat/completions");
    }

    #[tokio::test]
    async fn missing_credential_fails_before_connecting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let upstream = upstream(addr, None, Duration::from_secs(5));

        let err = upstream.send(&request()).await.unwrap_err();
        assert!(matches!(err, AssistantError::Config));

        // Nothing should have connected
        let accepted = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(accepted.is_err());
    }

    #[tokio::test]
    async fn silent_upstream_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept and hold the connection open without answering
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let upstream = upstream(addr, Some("sk-test"), Duration::from_millis(200));
        let err = upstream.send(&request()).await.unwrap_err();

        assert!(matches!(err, AssistantError::Timeout(timeout) if timeout == Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstream = upstream(addr, Some("sk-test"), Duration::from_secs(5));
        let err = upstream.send(&request()).await.unwrap_err();

        assert!(matches!(err, AssistantError::Network(_)), "unexpected error: {err:?}");
    }
}
