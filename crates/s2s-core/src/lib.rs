//! s2s-core - Segment track events forwarded to Singular's S2S event endpoint.
//!
//! A [`SegmentEvent`] plus destination [`Settings`] are mapped to the query
//! parameters of a single `GET /api/v1/evt` call. Only track events are
//! handled; the request is only sent when the event carries at least one
//! recognised device identifier.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use s2s_core::{EventMapper, HttpTransport, SegmentEvent, Settings};
//!
//! let mapper = EventMapper::new(Arc::new(HttpTransport::new()));
//! let event: SegmentEvent = serde_json::from_str(payload)?;
//!
//! match mapper.handle(&event, &Settings::new("sdk-key")).await {
//!     Ok(delivery) => println!("{:?}", delivery),
//!     Err(e) if e.is_retryable() => { /* redeliver later */ }
//!     Err(e) => return Err(e.into()),
//! }
//! ```

pub mod error;
pub mod event;
pub mod mapper;
pub mod params;
pub mod platform;
pub mod settings;
pub mod transport;

pub use error::{ErrorCode, S2sError, S2sResult};
pub use event::{EventContext, EventType, SegmentEvent};
pub use mapper::{
    Delivery, EventMapper, OutboundRequest, Prepared, SkipReason, SDK_VERSION,
    SINGULAR_EVENT_ENDPOINT,
};
pub use params::OutboundParams;
pub use platform::{IdentifierField, Platform};
pub use settings::Settings;
pub use transport::{HttpTransport, S2sTransport, TransportError};
