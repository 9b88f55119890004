//! Segment event to Singular S2S event mapping.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{S2sError, S2sResult};
use crate::event::{non_empty, EventType, SegmentEvent};
use crate::params::{keys, OutboundParams};
use crate::platform::{IdentifierField, Platform};
use crate::settings::Settings;
use crate::transport::S2sTransport;

/// Singular S2S event notification endpoint.
pub const SINGULAR_EVENT_ENDPOINT: &str = "https://s2s.singular.net/api/v1/evt";

/// Value of the `sdk_version` parameter.
pub const SDK_VERSION: &str = "SegmentS2SCustomFunction";

const UNKNOWN_EVENT_NAME: &str = "segment_unknown";

/// Why a track event produced no request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingSdkKey,
    MissingPlatform,
    NoDeviceIdentifier,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSdkKey => "missing_sdk_key",
            Self::MissingPlatform => "missing_platform",
            Self::NoDeviceIdentifier => "no_device_identifier",
        }
    }
}

/// Outcome of a successfully handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The request was sent and answered with a non-retryable status.
    Sent { status: u16 },
    /// No request was made.
    Skipped(SkipReason),
}

/// A fully derived outbound request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: Url,
    pub params: OutboundParams,
    pub identifiers: Vec<IdentifierField>,
}

/// Result of deriving a request without sending it.
#[derive(Debug, Clone)]
pub enum Prepared {
    Ready(OutboundRequest),
    Skipped(SkipReason),
}

/// Maps Segment events onto Singular S2S requests.
#[derive(Clone)]
pub struct EventMapper {
    transport: Arc<dyn S2sTransport>,
    endpoint: Url,
}

impl EventMapper {
    /// Create a mapper targeting the production Singular endpoint.
    pub fn new(transport: Arc<dyn S2sTransport>) -> Self {
        Self {
            transport,
            endpoint: Url::parse(SINGULAR_EVENT_ENDPOINT).expect("endpoint constant is a valid URL"),
        }
    }

    /// Create a mapper targeting a different endpoint base URL.
    pub fn with_endpoint(transport: Arc<dyn S2sTransport>, endpoint: &str) -> S2sResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| S2sError::Configuration(format!("Invalid endpoint URL '{}': {}", endpoint, e)))?;
        Ok(Self { transport, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Handle one event. Only track calls are supported.
    pub async fn handle(&self, event: &SegmentEvent, settings: &Settings) -> S2sResult<Delivery> {
        match &event.event_type {
            EventType::Track => self.on_track(event, settings).await,
            other => Err(S2sError::unsupported(other.as_str())),
        }
    }

    /// Map a track event and send it when it carries a device identifier.
    pub async fn on_track(&self, event: &SegmentEvent, settings: &Settings) -> S2sResult<Delivery> {
        let request = match self.build_request(event, settings)? {
            Prepared::Ready(request) => request,
            Prepared::Skipped(reason) => {
                debug!(
                    event = event.event.as_deref().unwrap_or_default(),
                    reason = reason.as_str(),
                    "Track event not forwarded"
                );
                return Ok(Delivery::Skipped(reason));
            }
        };

        self.send(&request).await
    }

    /// Derive the outbound request for a track event without sending it.
    pub fn build_request(&self, event: &SegmentEvent, settings: &Settings) -> S2sResult<Prepared> {
        let Some(sdk_key) = settings.sdk_key() else {
            return Ok(Prepared::Skipped(SkipReason::MissingSdkKey));
        };
        let Some(platform) = Platform::detect(event) else {
            return Ok(Prepared::Skipped(SkipReason::MissingPlatform));
        };

        let mut params = OutboundParams::new();

        if let Some(utime) = event.timestamp.as_deref().and_then(parse_epoch_seconds) {
            params.set(keys::UTIME, utime.to_string());
        }

        params.set(keys::SDK_KEY, sdk_key);
        params.set(keys::SDK_VERSION, SDK_VERSION);
        params.set(keys::CUSTOM_USER_ID, event.user_id.as_deref().unwrap_or_default());
        params.set(keys::USER_AGENT, event.context.user_agent.as_deref().unwrap_or_default());
        params.set(keys::LOCALE, event.context.locale.as_deref().unwrap_or_default());
        params.set(
            keys::EVENT_NAME,
            non_empty(event.event.as_deref()).unwrap_or(UNKNOWN_EVENT_NAME),
        );

        match non_empty(event.context.ip.as_deref()) {
            Some(ip) => params.set(keys::IP, ip),
            None => params.set(keys::USE_IP, "True"),
        }

        let identifiers = platform.apply(event, &mut params);

        apply_revenue(event, settings, &mut params);
        params.set(keys::EVENT_ARGS, event_args(event)?);

        if identifiers.is_empty() {
            return Ok(Prepared::Skipped(SkipReason::NoDeviceIdentifier));
        }

        let url = params.to_url(&self.endpoint);
        Ok(Prepared::Ready(OutboundRequest {
            url,
            params,
            identifiers,
        }))
    }

    async fn send(&self, request: &OutboundRequest) -> S2sResult<Delivery> {
        debug!(url = %request.url, "Sending S2S event");

        let status = self.transport.get(&request.url).await.map_err(|e| {
            warn!(error = %e, "S2S request failed, caller should retry");
            S2sError::transport(e.to_string())
        })?;

        if let Some(err) = S2sError::from_http_status(status) {
            warn!(status, "S2S endpoint asked for a retry");
            return Err(err);
        }

        info!(
            status,
            identifiers = request.identifiers.len(),
            "S2S event delivered"
        );
        Ok(Delivery::Sent { status })
    }
}

/// Parse an event timestamp into whole seconds since the Unix epoch.
///
/// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC). Sub-second
/// precision is truncated, so `...T00:00:00.999Z` yields the same value as
/// `...T00:00:00Z`; `utime` is always an integer.
pub fn parse_epoch_seconds(timestamp: &str) -> Option<i64> {
    let timestamp = timestamp.trim();
    if timestamp.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(parsed.timestamp());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(timestamp, format) {
            return Some(parsed.and_utc().timestamp());
        }
    }

    NaiveDate::parse_from_str(timestamp, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc().timestamp())
}

fn apply_revenue(event: &SegmentEvent, settings: &Settings, params: &mut OutboundParams) {
    if let Some(required) = settings.revenue_event_name.as_deref() {
        if event.event.as_deref() != Some(required) {
            return;
        }
    }

    let revenue = event.properties.get("revenue").and_then(param_value);
    let currency = event.properties.get("currency").and_then(param_value);

    if let (Some(revenue), Some(currency)) = (revenue, currency) {
        params.set(keys::AMOUNT, revenue);
        params.set(keys::CURRENCY, currency);
        params.set(keys::IS_REVENUE_EVENT, "true");
    }
}

/// Render a property as a parameter value. Numbers keep serde_json's
/// shortest round-trip formatting.
fn param_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// All event properties plus the user identifiers, as a JSON string.
fn event_args(event: &SegmentEvent) -> S2sResult<String> {
    let mut args: Map<String, Value> = event.properties.clone();
    args.insert(
        "anonymousId".to_string(),
        Value::from(event.anonymous_id.clone().unwrap_or_default()),
    );
    args.insert(
        "userId".to_string(),
        Value::from(event.user_id.clone().unwrap_or_default()),
    );
    Ok(serde_json::to_string(&args)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Device;
    use crate::transport::{MockS2sTransport, TransportError};
    use serde_json::json;

    const IDFA: &str = "AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE";

    fn ios_event() -> SegmentEvent {
        SegmentEvent::track("Level Up")
            .with_library("analytics-ios")
            .with_device(Device {
                advertising_id: Some(IDFA.to_string()),
                ..Default::default()
            })
    }

    fn mapper_returning(status: u16) -> EventMapper {
        let mut transport = MockS2sTransport::new();
        transport.expect_get().times(1).returning(move |_| Ok(status));
        EventMapper::new(Arc::new(transport))
    }

    fn mapper_never_called() -> EventMapper {
        let mut transport = MockS2sTransport::new();
        transport.expect_get().never();
        EventMapper::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_unsupported_event_types() {
        let mapper = mapper_never_called();
        let settings = Settings::new("KEY123");

        for event_type in [
            EventType::Identify,
            EventType::Group,
            EventType::Page,
            EventType::Screen,
            EventType::Alias,
            EventType::Delete,
        ] {
            let name = event_type.to_string();
            let err = mapper
                .handle(&SegmentEvent::new(event_type), &settings)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                S2sError::UnsupportedOperation { ref event_type, .. } if *event_type == name
            ));
        }
    }

    #[tokio::test]
    async fn test_track_sends_once() {
        let mapper = mapper_returning(200);
        let delivery = mapper.handle(&ios_event(), &Settings::new("KEY123")).await.unwrap();
        assert_eq!(delivery, Delivery::Sent { status: 200 });
    }

    #[tokio::test]
    async fn test_retryable_statuses() {
        for status in [500, 503, 429] {
            let mapper = mapper_returning(status);
            let err = mapper
                .handle(&ios_event(), &Settings::new("KEY123"))
                .await
                .unwrap_err();
            assert!(err.is_retryable(), "status {} should be retryable", status);
        }
    }

    #[tokio::test]
    async fn test_client_errors_are_terminal_success() {
        let mapper = mapper_returning(404);
        let delivery = mapper.handle(&ios_event(), &Settings::new("KEY123")).await.unwrap();
        assert_eq!(delivery, Delivery::Sent { status: 404 });
    }

    #[tokio::test]
    async fn test_transport_failure_is_retryable() {
        let mut transport = MockS2sTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| Err(TransportError("connection reset".to_string())));
        let mapper = EventMapper::new(Arc::new(transport));

        let err = mapper
            .handle(&ios_event(), &Settings::new("KEY123"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_missing_sdk_key_skips() {
        let mapper = mapper_never_called();
        let delivery = mapper.handle(&ios_event(), &Settings::default()).await.unwrap();
        assert_eq!(delivery, Delivery::Skipped(SkipReason::MissingSdkKey));
    }

    #[test]
    fn test_common_fields() {
        let mapper = mapper_never_called();
        let mut event = ios_event();
        event.user_id = Some("user-1".to_string());
        event.timestamp = Some("2024-01-01T00:00:00.000Z".to_string());
        event.context.ip = Some("203.0.113.7".to_string());

        let Prepared::Ready(request) = mapper.build_request(&event, &Settings::new("KEY123")).unwrap()
        else {
            panic!("expected a request");
        };
        let params = &request.params;

        assert_eq!(params.get(keys::SDK_KEY), Some("KEY123"));
        assert_eq!(params.get(keys::SDK_VERSION), Some(SDK_VERSION));
        assert_eq!(params.get(keys::CUSTOM_USER_ID), Some("user-1"));
        assert_eq!(params.get(keys::EVENT_NAME), Some("Level Up"));
        assert_eq!(params.get(keys::UTIME), Some("1704067200"));
        assert_eq!(params.get(keys::IP), Some("203.0.113.7"));
        assert_eq!(params.get(keys::USER_AGENT), Some(""));
        assert_eq!(params.get(keys::LOCALE), Some(""));
        assert!(!params.contains(keys::USE_IP));
    }

    #[test]
    fn test_fallbacks() {
        let mapper = mapper_never_called();
        let mut event = ios_event();
        event.event = None;
        event.timestamp = Some("not a date".to_string());

        let Prepared::Ready(request) = mapper.build_request(&event, &Settings::new("KEY123")).unwrap()
        else {
            panic!("expected a request");
        };

        assert_eq!(request.params.get(keys::EVENT_NAME), Some("segment_unknown"));
        assert_eq!(request.params.get(keys::USE_IP), Some("True"));
        assert!(!request.params.contains(keys::UTIME));
        assert!(!request.params.contains(keys::IP));
    }

    #[test]
    fn test_empty_ip_uses_request_ip() {
        let mapper = mapper_never_called();
        let mut event = ios_event();
        event.context.ip = Some(String::new());

        let Prepared::Ready(request) = mapper.build_request(&event, &Settings::new("KEY123")).unwrap()
        else {
            panic!("expected a request");
        };

        assert_eq!(request.params.get(keys::USE_IP), Some("True"));
        assert!(!request.params.contains(keys::IP));
    }

    #[test]
    fn test_revenue_gate() {
        let mapper = mapper_never_called();
        let settings = Settings::new("KEY123").with_revenue_event_name("Order Completed");
        let event = ios_event()
            .with_property("revenue", 9.99)
            .with_property("currency", "USD");

        let Prepared::Ready(request) = mapper.build_request(&event, &settings).unwrap() else {
            panic!("expected a request");
        };
        assert!(!request.params.contains(keys::AMOUNT));

        let mut event = event;
        event.event = Some("Order Completed".to_string());
        let Prepared::Ready(request) = mapper.build_request(&event, &settings).unwrap() else {
            panic!("expected a request");
        };
        assert_eq!(request.params.get(keys::AMOUNT), Some("9.99"));
        assert_eq!(request.params.get(keys::CURRENCY), Some("USD"));
        assert_eq!(request.params.get(keys::IS_REVENUE_EVENT), Some("true"));
    }

    #[test]
    fn test_revenue_requires_currency() {
        let mapper = mapper_never_called();
        let event = ios_event().with_property("revenue", 10);

        let Prepared::Ready(request) = mapper.build_request(&event, &Settings::new("KEY123")).unwrap()
        else {
            panic!("expected a request");
        };
        assert!(!request.params.contains(keys::AMOUNT));
        assert!(!request.params.contains(keys::IS_REVENUE_EVENT));
    }

    #[test]
    fn test_event_args_include_user_ids() {
        let mut event = SegmentEvent::track("x").with_property("plan", json!({"tier": "pro"}));
        event.anonymous_id = Some("anon-1".to_string());

        let args: Value = serde_json::from_str(&event_args(&event).unwrap()).unwrap();
        assert_eq!(args["plan"]["tier"], "pro");
        assert_eq!(args["anonymousId"], "anon-1");
        assert_eq!(args["userId"], "");
    }

    #[test]
    fn test_parse_epoch_seconds() {
        assert_eq!(parse_epoch_seconds("2024-01-01T00:00:00Z"), Some(1_704_067_200));
        assert_eq!(parse_epoch_seconds("2024-01-01T01:00:00+01:00"), Some(1_704_067_200));
        assert_eq!(parse_epoch_seconds("2024-01-01T00:00:00.999"), Some(1_704_067_200));
        assert_eq!(parse_epoch_seconds("2024-01-01T00:00:00.999Z"), Some(1_704_067_200));
        assert_eq!(parse_epoch_seconds("2024-01-01"), Some(1_704_067_200));
        assert_eq!(parse_epoch_seconds(""), None);
        assert_eq!(parse_epoch_seconds("yesterday"), None);
    }

    #[test]
    fn test_invalid_endpoint_is_configuration_error() {
        let transport = Arc::new(MockS2sTransport::new());
        let err = EventMapper::with_endpoint(transport, "not a url").err().unwrap();
        assert!(matches!(err, S2sError::Configuration(_)));
    }
}
