// Access Token Cache
//
// Holds the single bearer credential used for Acquired.com calls and
// performs the login exchange when the cached one is missing or too close
// to expiry. Concurrent refreshes are coalesced behind one in-flight login.

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::transport::{HttpTransport, OutboundRequest};
use crate::error::GatewayError;

/// A bearer token and the instant the API stops accepting it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Usable while `now` is still `margin` ahead of the expiry
    pub fn is_usable(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        self.expires_at
            .checked_sub_signed(margin)
            .is_some_and(|deadline| now < deadline)
    }
}

/// Body returned by `POST /login`
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    token_type: Option<String>,
}

pub struct TokenCache {
    transport: Arc<dyn HttpTransport>,
    login_url: String,
    app_id: String,
    app_key: String,
    margin: TimeDelta,
    credential: RwLock<Option<Credential>>,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        login_url: impl Into<String>,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
        margin: Duration,
    ) -> Self {
        Self {
            transport,
            login_url: login_url.into(),
            app_id: app_id.into(),
            app_key: app_key.into(),
            margin: TimeDelta::from_std(margin).unwrap_or(TimeDelta::zero()),
            credential: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Return a usable token, logging in first if necessary.
    ///
    /// A failed login leaves the cache untouched.
    pub async fn get_token(&self) -> Result<String, GatewayError> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;
        // Another caller may have finished a login while we waited
        if let Some(token) = self.cached_token().await {
            debug!("using token refreshed by a concurrent caller");
            return Ok(token);
        }

        let credential = self.authenticate().await?;
        let token = credential.token.clone();
        *self.credential.write().await = Some(credential);
        Ok(token)
    }

    /// Drop the cached credential if it is still the one that was rejected
    pub async fn invalidate(&self, rejected_token: &str) {
        let mut slot = self.credential.write().await;
        if slot.as_ref().is_some_and(|c| c.token == rejected_token) {
            info!("invalidating rejected access token");
            *slot = None;
        }
    }

    /// Replace the cached credential
    pub async fn store(&self, credential: Credential) {
        *self.credential.write().await = Some(credential);
    }

    /// Snapshot of the cached credential, usable or not
    pub async fn credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    async fn cached_token(&self) -> Option<String> {
        let slot = self.credential.read().await;
        slot.as_ref()
            .filter(|c| c.is_usable(Utc::now(), self.margin))
            .map(|c| c.token.clone())
    }

    async fn authenticate(&self) -> Result<Credential, GatewayError> {
        info!("requesting new access token from {}", self.login_url);

        let request = OutboundRequest::new(Method::POST, self.login_url.as_str()).json(json!({
            "app_id": self.app_id,
            "app_key": self.app_key,
        }));

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "login request failed");
            GatewayError::Authentication(e.to_string())
        })?;

        if !response.status.is_success() {
            warn!(status = response.status.as_u16(), "login rejected");
            return Err(GatewayError::Authentication(format!(
                "failed to obtain access token (status {})",
                response.status.as_u16()
            )));
        }

        let login: LoginResponse = serde_json::from_str(&response.body)
            .map_err(|e| GatewayError::Authentication(format!("invalid login response: {}", e)))?;
        let expires_at = TimeDelta::try_seconds(login.expires_in)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| GatewayError::Authentication(format!("invalid expires_in {}", login.expires_in)))?;

        debug!(
            expires_in = login.expires_in,
            token_type = login.token_type.as_deref().unwrap_or("Bearer"),
            "access token obtained"
        );
        Ok(Credential {
            token: login.access_token,
            expires_at,
        })
    }
}
