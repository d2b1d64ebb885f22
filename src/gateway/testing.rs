// Scripted transport used by the unit tests

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::transport::{HttpTransport, OutboundRequest, TransportResponse};
use crate::error::GatewayError;

type Scripted = Result<TransportResponse, GatewayError>;

/// Replays queued responses; login and API calls have separate queues.
/// An exhausted login queue issues `token-N`, an exhausted API queue
/// answers `200 {"ok": true}`.
#[derive(Default)]
pub struct ScriptedTransport {
    logins: Mutex<VecDeque<Scripted>>,
    calls: Mutex<VecDeque<Scripted>>,
    sent: Mutex<Vec<OutboundRequest>>,
    login_delay: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login_delay(delay: Duration) -> Self {
        Self { login_delay: delay, ..Self::default() }
    }

    pub fn push_login(&self, response: Scripted) -> &Self {
        self.logins.lock().unwrap().push_back(response);
        self
    }

    pub fn push_call(&self, response: Scripted) -> &Self {
        self.calls.lock().unwrap().push_back(response);
        self
    }

    pub fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn login_count(&self) -> usize {
        self.sent().iter().filter(|r| r.url.ends_with("/login")).count()
    }

    pub fn call_count(&self) -> usize {
        self.sent().iter().filter(|r| !r.url.ends_with("/login")).count()
    }
}

pub fn response(status: u16, body: Value) -> Scripted {
    Ok(TransportResponse {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
    })
}

pub fn login_ok(token: &str, expires_in: i64) -> Scripted {
    response(
        200,
        json!({"access_token": token, "expires_in": expires_in, "token_type": "Bearer"}),
    )
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, GatewayError> {
        let is_login = request.url.ends_with("/login");
        self.sent.lock().unwrap().push(request);

        if is_login {
            if !self.login_delay.is_zero() {
                tokio::time::sleep(self.login_delay).await;
            }
            let next = self.logins.lock().unwrap().pop_front();
            match next {
                Some(scripted) => scripted,
                None => {
                    let n = self.login_count();
                    login_ok(&format!("token-{}", n), 3600)
                }
            }
        } else {
            let next = self.calls.lock().unwrap().pop_front();
            next.unwrap_or_else(|| response(200, json!({"ok": true})))
        }
    }
}
