//! Server state.

use std::sync::Arc;

use s2s_core::{EventMapper, HttpTransport, S2sResult, S2sTransport, Settings};

use crate::config::ServerConfig;

/// Shared application state. Immutable once the server starts.
#[derive(Clone)]
pub struct AppState {
    pub mapper: Arc<EventMapper>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(mapper: EventMapper, settings: Settings) -> Self {
        Self {
            mapper: Arc::new(mapper),
            settings: Arc::new(settings),
        }
    }

    /// Build state from configuration, using a reqwest transport.
    pub fn from_config(config: &ServerConfig) -> S2sResult<Self> {
        let transport: Arc<dyn S2sTransport> = match config.http_timeout {
            Some(timeout) => Arc::new(HttpTransport::with_timeout(timeout)?),
            None => Arc::new(HttpTransport::new()),
        };
        let mapper = EventMapper::with_endpoint(transport, &config.endpoint)?;
        Ok(Self::new(mapper, config.settings.clone()))
    }

    /// Whether events can be forwarded at all.
    pub fn is_configured(&self) -> bool {
        self.settings.sdk_key().is_some()
    }
}
