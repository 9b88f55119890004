//! Inbound Segment event model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Segment call type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Track,
    Identify,
    Group,
    Page,
    Screen,
    Alias,
    Delete,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Track => "track",
            Self::Identify => "identify",
            Self::Group => "group",
            Self::Page => "page",
            Self::Screen => "screen",
            Self::Alias => "alias",
            Self::Delete => "delete",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "track" => Self::Track,
            "identify" => Self::Identify,
            "group" => Self::Group,
            "page" => Self::Page,
            "screen" => Self::Screen,
            "alias" => Self::Alias,
            "delete" => Self::Delete,
            _ => Self::Other(value),
        }
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single Segment event as delivered to a destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Event name, only meaningful for track calls.
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub anonymous_id: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub context: EventContext,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    #[serde(default)]
    pub library: Option<Library>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub app: Option<App>,
    #[serde(default)]
    pub os: Option<Os>,
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub page: Option<Page>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct App {
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Os {
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub advertising_id: Option<String>,
    #[serde(default)]
    pub ad_tracking_enabled: Option<bool>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub url: Option<String>,
}

/// Treat empty strings like missing values.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl SegmentEvent {
    /// Create a bare event of the given type.
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            event: None,
            timestamp: None,
            user_id: None,
            anonymous_id: None,
            properties: Map::new(),
            context: EventContext::default(),
        }
    }

    /// Create a named track event.
    pub fn track(name: impl Into<String>) -> Self {
        let mut event = Self::new(EventType::Track);
        event.event = Some(name.into());
        event
    }

    /// A non-empty string property, or `None` for anything else.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        non_empty(self.properties.get(key).and_then(Value::as_str))
    }

    pub fn library_name(&self) -> Option<&str> {
        non_empty(self.context.library.as_ref().and_then(|l| l.name.as_deref()))
    }

    pub fn device(&self) -> Option<&Device> {
        self.context.device.as_ref()
    }

    pub fn device_type(&self) -> Option<&str> {
        non_empty(self.device().and_then(|d| d.device_type.as_deref()))
    }

    pub fn app_namespace(&self) -> Option<&str> {
        non_empty(self.context.app.as_ref().and_then(|a| a.namespace.as_deref()))
    }

    pub fn os_version(&self) -> Option<&str> {
        non_empty(self.context.os.as_ref().and_then(|o| o.version.as_deref()))
    }

    /// Builder: set a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Builder: set the library name.
    pub fn with_library(mut self, name: impl Into<String>) -> Self {
        self.context.library = Some(Library {
            name: Some(name.into()),
            version: None,
        });
        self
    }

    /// Builder: set the device.
    pub fn with_device(mut self, device: Device) -> Self {
        self.context.device = Some(device);
        self
    }
}
