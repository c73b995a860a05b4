//! Command transport to ASF IPC endpoints.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::limiter::RateLimiter;

/// Address and shared credential of one IPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl Endpoint {
    #[must_use]
    pub fn command_url(&self) -> String {
        format!("http://{}:{}/Api/Command", self.host, self.port)
    }

    /// Rate limiting key; every bot behind the same host shares it.
    #[must_use]
    pub fn limiter_key(&self) -> &str {
        &self.host
    }
}

/// Transport-level failure sending a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} answered with HTTP status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("{endpoint} returned an unreadable body")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Sends one text command and returns the endpoint's text response.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    async fn execute(&self, command: &str) -> Result<String, CommandError>;
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CommandRequest<'a> {
    command: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CommandResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl CommandResponse {
    fn into_text(self) -> String {
        self.result.or(self.message).unwrap_or_default()
    }
}

/// HTTP channel to an ASF `/Api/Command` endpoint.
#[derive(Debug, Clone)]
pub struct AsfChannel {
    client: reqwest::Client,
    url: String,
    password: String,
}

impl AsfChannel {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: &Endpoint) -> Self {
        Self {
            client,
            url: endpoint.command_url(),
            password: endpoint.password.clone(),
        }
    }
}

#[async_trait]
impl CommandChannel for AsfChannel {
    async fn execute(&self, command: &str) -> Result<String, CommandError> {
        let response = self
            .client
            .post(&self.url)
            .header("Authentication", &self.password)
            .json(&CommandRequest { command })
            .send()
            .await
            .map_err(|source| CommandError::Transport {
                endpoint: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CommandError::Status {
                endpoint: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body: CommandResponse =
            response
                .json()
                .await
                .map_err(|source| CommandError::Decode {
                    endpoint: self.url.clone(),
                    source,
                })?;
        Ok(body.into_text())
    }
}

/// Wraps a channel so every command first takes a permit for its endpoint.
pub struct RateLimitedChannel<C> {
    inner: C,
    limiter: Arc<RateLimiter>,
    key: String,
}

impl<C> RateLimitedChannel<C> {
    pub fn new(inner: C, limiter: Arc<RateLimiter>, key: impl Into<String>) -> Self {
        Self {
            inner,
            limiter,
            key: key.into(),
        }
    }
}

#[async_trait]
impl<C: CommandChannel> CommandChannel for RateLimitedChannel<C> {
    async fn execute(&self, command: &str) -> Result<String, CommandError> {
        self.limiter.acquire(&self.key).await;
        self.inner.execute(command).await
    }
}
