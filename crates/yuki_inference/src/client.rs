//! HTTP client for the upstream inference server.

use crate::request::{ChatPayload, GeneratePayload};
use crate::response::{extract_text, reported_error, token_estimate};
use crate::stream::relay;
use crate::{ApiMode, Endpoint, GenerationResult, HealthReport, InferenceConfig, RetryPolicy, TokenStream};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use yuki_core::GenerationRequest;
use yuki_error::{GatewayError, GatewayErrorKind};

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Dispatches generation requests to the inference server.
///
/// Cloning is cheap and clones share one connection pool. Besides the pool
/// and the configuration there is no state shared between calls.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    config: InferenceConfig,
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl InferenceClient {
    /// Create a client for the configured server.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the configuration is invalid or the
    /// HTTP client cannot be built.
    #[instrument(skip(config), fields(base_url = %config.base_url, model = %config.model, api_mode = %config.api_mode))]
    pub fn new(config: &InferenceConfig) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::new(GatewayErrorKind::Configuration(e.message)))?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| GatewayError::new(GatewayErrorKind::Configuration(e.to_string())))?;

        info!("Created inference client");
        Ok(Self {
            config: config.clone(),
            client,
            policy: RetryPolicy::new(config.retry_max_attempts, config.backoff_base()),
        })
    }

    /// The client configuration.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// The retry policy applied to each endpoint call.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    /// Probe the server with `GET /api/tags`.
    ///
    /// Never fails; every problem is reported as an unreachable result.
    #[instrument(skip(self))]
    pub async fn health(&self) -> HealthReport {
        let url = self.url("/api/tags");
        let response = match self
            .client
            .get(&url)
            .timeout(self.config.timeout())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Health probe failed");
                return HealthReport::down(None, e.to_string());
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Health probe returned non-200");
            return HealthReport::down(Some(status.as_u16()), format!("server returned {}", status));
        }

        match response.json::<Value>().await {
            Ok(tags) => {
                debug!("Inference server is reachable");
                HealthReport::up(status.as_u16(), tags)
            }
            Err(e) => HealthReport::down(Some(status.as_u16()), e.to_string()),
        }
    }

    /// Run one non-streaming completion.
    ///
    /// The endpoint follows the configured [`ApiMode`]. In `Auto` mode a
    /// "not found" from the message-array endpoint switches this call to the
    /// single-prompt endpoint; any other failure is returned as-is.
    #[instrument(skip(self, request), fields(api_mode = %self.config.api_mode))]
    pub async fn complete_once(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GatewayError> {
        match self.config.api_mode {
            ApiMode::Generate => self.complete_on(Endpoint::Generate, request).await,
            ApiMode::Chat => self.complete_on(Endpoint::Chat, request).await,
            ApiMode::Auto => match self.complete_on(Endpoint::Chat, request).await {
                Err(err) if is_not_found(&err) => {
                    info!("Chat endpoint not found, falling back to generate");
                    self.complete_on(Endpoint::Generate, request).await
                }
                other => other,
            },
        }
    }

    /// Open a streamed completion.
    ///
    /// Opening the stream (up to the response status) is retried like a
    /// non-streaming call, and `Auto` fallback is decided there. Nothing is
    /// retried once the body has started.
    #[instrument(skip(self, request), fields(api_mode = %self.config.api_mode))]
    pub async fn complete_streaming(
        &self,
        request: &GenerationRequest,
    ) -> Result<TokenStream, GatewayError> {
        match self.config.api_mode {
            ApiMode::Generate => self.open_stream(Endpoint::Generate, request).await,
            ApiMode::Chat => self.open_stream(Endpoint::Chat, request).await,
            ApiMode::Auto => match self.open_stream(Endpoint::Chat, request).await {
                Err(err) if is_not_found(&err) => {
                    info!("Chat endpoint not found, streaming from generate");
                    self.open_stream(Endpoint::Generate, request).await
                }
                other => other,
            },
        }
    }

    fn payload(&self, endpoint: Endpoint, request: &GenerationRequest, stream: bool) -> Result<Value, GatewayError> {
        let payload = match endpoint {
            Endpoint::Generate => serde_json::to_value(GeneratePayload {
                model: &self.config.model,
                system: request.system(),
                prompt: request.prompt(),
                stream,
            }),
            Endpoint::Chat => serde_json::to_value(ChatPayload {
                model: &self.config.model,
                messages: request.messages(),
                stream,
            }),
        };
        payload.map_err(|e| GatewayError::new(GatewayErrorKind::Configuration(e.to_string())))
    }

    async fn complete_on(
        &self,
        endpoint: Endpoint,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GatewayError> {
        let url = self.url(endpoint.path());
        let body = self.payload(endpoint, request, false)?;
        let (url, body) = (&url, &body);

        let (text, payload, latency) = self
            .policy
            .run(endpoint, move |_| self.post_once(endpoint, url, body))
            .await?;

        let prompt_chars = match endpoint {
            Endpoint::Generate => request.prompt_chars(),
            Endpoint::Chat => request.message_chars(),
        };
        let tokens = token_estimate(&payload, prompt_chars, &text);
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

        debug!(endpoint = %endpoint, latency_ms, tokens, "Completion succeeded");
        Ok(GenerationResult::new(
            text,
            self.config.model.clone(),
            endpoint,
            latency_ms,
            tokens,
            payload,
        ))
    }

    /// One attempt: request, status check, body read and payload validation.
    async fn post_once(
        &self,
        endpoint: Endpoint,
        url: &str,
        body: &Value,
    ) -> Result<(String, Value, Duration), GatewayError> {
        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .timeout(self.config.timeout())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(endpoint, response).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        let latency = started.elapsed();

        let payload: Value = serde_json::from_slice(&bytes).map_err(|e| {
            GatewayError::new(GatewayErrorKind::MalformedResponse(format!(
                "invalid JSON from {}: {}",
                endpoint.path(),
                e
            )))
        })?;
        if let Some(message) = reported_error(&payload) {
            return Err(GatewayError::new(GatewayErrorKind::UpstreamReported(message)));
        }
        let text = extract_text(endpoint, &payload).map_err(GatewayError::new)?;
        Ok((text, payload, latency))
    }

    async fn open_stream(
        &self,
        endpoint: Endpoint,
        request: &GenerationRequest,
    ) -> Result<TokenStream, GatewayError> {
        let url = self.url(endpoint.path());
        let body = self.payload(endpoint, request, true)?;
        let (url, body) = (&url, &body);

        let response = self
            .policy
            .run(endpoint, move |_| self.connect_stream(endpoint, url, body))
            .await?;

        debug!(endpoint = %endpoint, "Stream opened");
        Ok(TokenStream::new(
            endpoint,
            relay(endpoint, response.bytes_stream(), self.config.timeout()),
        ))
    }

    /// Send a streaming request and wait for the response head only.
    async fn connect_stream(
        &self,
        endpoint: Endpoint,
        url: &str,
        body: &Value,
    ) -> Result<Response, GatewayError> {
        let send = self.client.post(url).json(body).send();
        let response = tokio::time::timeout(self.config.timeout(), send)
            .await
            .map_err(|_| {
                GatewayError::new(GatewayErrorKind::Transient {
                    status: None,
                    retry_after: None,
                    message: format!("no response from {} within {:?}", endpoint.path(), self.config.timeout()),
                })
            })?
            .map_err(transport_error)?;
        check_status(endpoint, response).await
    }
}

fn is_not_found(err: &GatewayError) -> bool {
    matches!(err.kind, GatewayErrorKind::EndpointNotFound(_))
}

/// Classify a transport failure. Requests that could not be built are
/// configuration problems; everything else is a network-level failure.
#[track_caller]
fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_builder() {
        return GatewayError::new(GatewayErrorKind::Configuration(e.to_string()));
    }
    GatewayError::new(GatewayErrorKind::Transient {
        status: None,
        retry_after: None,
        message: e.to_string(),
    })
}

/// Map a response status onto the failure taxonomy, passing successes
/// through.
async fn check_status(endpoint: Endpoint, response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(GatewayError::new(GatewayErrorKind::EndpointNotFound(
            endpoint.path().to_string(),
        )));
    }

    let retry_after = (status == StatusCode::TOO_MANY_REQUESTS)
        .then(|| parse_retry_after(&response))
        .flatten();
    let message = error_body(response).await;

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(GatewayError::new(GatewayErrorKind::Transient {
            status: Some(status.as_u16()),
            retry_after,
            message,
        }))
    } else {
        Err(GatewayError::new(GatewayErrorKind::Http {
            status: status.as_u16(),
            message,
        }))
    }
}

/// `Retry-After` as delta-seconds; fractional values are accepted.
fn parse_retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get(reqwest::header::RETRY_AFTER)?;
    let seconds: f64 = value.to_str().ok()?.trim().parse().ok()?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

async fn error_body(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        _ => status.to_string(),
    }
}
