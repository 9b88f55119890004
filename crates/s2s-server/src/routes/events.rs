//! Event intake endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;

use s2s_core::{Delivery, SegmentEvent};

use crate::error::ApiResult;
use crate::state::AppState;

/// Response for a handled event.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Whether a request reached the S2S endpoint.
    pub delivered: bool,
    /// Status returned by the S2S endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Why nothing was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Delivery> for EventResponse {
    fn from(delivery: Delivery) -> Self {
        match delivery {
            Delivery::Sent { status } => Self {
                delivered: true,
                status: Some(status),
                reason: None,
            },
            Delivery::Skipped(reason) => Self {
                delivered: false,
                status: None,
                reason: Some(reason.as_str().to_string()),
            },
        }
    }
}

/// Handle one Segment event.
/// POST /events
pub async fn receive_event(
    State(state): State<AppState>,
    Json(event): Json<SegmentEvent>,
) -> ApiResult<Json<EventResponse>> {
    let delivery = state
        .mapper
        .handle(&event, &state.settings)
        .await
        .map_err(|e| {
            warn!(event_type = %event.event_type, error = %e, "Event rejected");
            e
        })?;

    Ok(Json(delivery.into()))
}
