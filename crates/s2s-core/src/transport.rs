//! Outbound HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::error::{S2sError, S2sResult};

/// The request never produced a response.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// Issues the outbound GET and reports the response status.
///
/// Response bodies are never read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait S2sTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<u16, TransportError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> S2sResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| S2sError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl S2sTransport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<u16, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        Ok(response.status().as_u16())
    }
}
