//! Server configuration loaded from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use s2s_core::{S2sError, S2sResult, Settings, SINGULAR_EVENT_ENDPOINT};

/// Host-level configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the S2S event endpoint.
    pub endpoint: String,
    /// Timeout applied to every outbound request. `None` leaves it unbounded.
    pub http_timeout: Option<Duration>,
    /// Destination settings applied to every event.
    pub settings: Settings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            endpoint: SINGULAR_EVENT_ENDPOINT.to_string(),
            http_timeout: None,
            settings: Settings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> S2sResult<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("S2S_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("S2S_PORT") {
            config.port = port
                .parse()
                .map_err(|_| S2sError::Configuration(format!("S2S_PORT is not a valid port: {}", port)))?;
        }

        if let Ok(endpoint) = std::env::var("S2S_ENDPOINT_URL") {
            config.endpoint = endpoint;
        }

        if let Ok(secs) = std::env::var("S2S_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                S2sError::Configuration(format!("S2S_HTTP_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.http_timeout = Some(Duration::from_secs(secs));
        }

        config.settings = Settings::from_env();

        Ok(config)
    }

    pub fn addr(&self) -> S2sResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| S2sError::Configuration(format!("Invalid listen address: {}", e)))
    }
}
