// Authenticated Acquired.com Client
//
// Attaches the cached bearer token to every call, recovers once from a
// rejected token, and retries transient failures with linear backoff.

use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::retry::{is_retryable_status, RetryPolicy};
use super::token_cache::TokenCache;
use super::transport::{HttpTransport, OutboundRequest};
use crate::config::AcquiredConfig;
use crate::error::GatewayError;

/// What a single exchange means for the retry loop
#[derive(Debug)]
enum Attempt {
    Success(Value),
    Unauthorized,
    Retryable(GatewayError),
    Terminal(GatewayError),
}

/// HTTP client for the versioned Acquired.com API
pub struct AcquiredClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenCache>,
    api_url: String,
    headers: Vec<(String, String)>,
    retry: RetryPolicy,
}

impl AcquiredClient {
    /// `api_url` is the versioned prefix, e.g. `https://api.acquired.com/v1`
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenCache>,
        api_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            tokens,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            headers: Vec::new(),
            retry,
        }
    }

    /// Wire a client and its token cache from configuration
    pub fn from_config(config: &AcquiredConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let tokens = Arc::new(TokenCache::new(
            Arc::clone(&transport),
            config.login_url(),
            config.app_id.clone(),
            config.app_key.clone(),
            config.token_margin,
        ));

        let mut client = Self::new(transport, tokens, config.api_url(), config.retry);
        if let Some(company_id) = &config.company_id {
            client = client.with_header("Company-Id", company_id.clone());
        }
        if let Some(mid) = &config.mid {
            client = client.with_header("Mid", mid.clone());
        }
        client
    }

    /// Add a header sent on every authenticated call
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, GatewayError> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value, GatewayError> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// Perform an authenticated call and return the parsed JSON body.
    ///
    /// A 401 clears the token and repeats the call once with a fresh one;
    /// a second 401 is an `Authentication` error. Transport failures, 5xx
    /// and 429 are retried up to `RetryPolicy::max_retries` times.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.api_url, endpoint);
        let mut reauthenticated = false;
        let mut retries = 0u32;

        info!("🌐 Making {} request to: {}", method, url);

        loop {
            let token = self.tokens.get_token().await?;

            match self.attempt(&method, &url, &token, body.as_ref()).await {
                Attempt::Success(value) => return Ok(value),
                Attempt::Unauthorized if reauthenticated => {
                    error!(url = %url, "access token rejected twice");
                    return Err(GatewayError::Authentication(
                        "API rejected a freshly issued access token".to_string(),
                    ));
                }
                Attempt::Unauthorized => {
                    warn!(url = %url, "access token rejected, re-authenticating once");
                    self.tokens.invalidate(&token).await;
                    reauthenticated = true;
                }
                Attempt::Retryable(err) if self.retry.allows(retries) => {
                    retries += 1;
                    let delay = self.retry.delay_for(retries);
                    warn!(
                        error = %err,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Attempt::Retryable(err) | Attempt::Terminal(err) => {
                    error!(url = %url, error = %err, "request failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Attempt {
        let mut request = OutboundRequest::new(method.clone(), url).bearer(token);
        for (name, value) in &self.headers {
            request = request.header(name.clone(), value.clone());
        }
        if let Some(body) = body {
            request = request.json(body.clone());
        }

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => return Attempt::Retryable(err),
        };

        let status = response.status;
        if status.is_success() {
            return Attempt::Success(response.json_body());
        }
        if status == StatusCode::UNAUTHORIZED {
            return Attempt::Unauthorized;
        }

        let err = GatewayError::api_request(status.as_u16(), response.json_body());
        if is_retryable_status(status) {
            Attempt::Retryable(err)
        } else {
            Attempt::Terminal(err)
        }
    }
}
