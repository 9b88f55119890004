//! Destination settings.

use serde::{Deserialize, Serialize};

/// Per-destination settings supplied alongside each event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Singular SDK key, sent as the `a` parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular_sdk_key: Option<String>,
    /// When set, revenue is only forwarded for events with exactly this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_event_name: Option<String>,
}

impl Settings {
    /// Create settings with the given SDK key.
    pub fn new(sdk_key: impl Into<String>) -> Self {
        Self {
            singular_sdk_key: Some(sdk_key.into()),
            revenue_event_name: None,
        }
    }

    /// Load settings from environment variables.
    pub fn from_env() -> Self {
        Self {
            singular_sdk_key: std::env::var("SINGULAR_SDK_KEY").ok(),
            revenue_event_name: std::env::var("SINGULAR_REVENUE_EVENT_NAME").ok(),
        }
    }

    /// Builder: only forward revenue for the named event.
    pub fn with_revenue_event_name(mut self, name: impl Into<String>) -> Self {
        self.revenue_event_name = Some(name.into());
        self
    }

    /// The SDK key, if configured and non-empty.
    pub fn sdk_key(&self) -> Option<&str> {
        self.singular_sdk_key.as_deref().filter(|k| !k.is_empty())
    }
}
