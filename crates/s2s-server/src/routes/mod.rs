//! Route definitions for the event host.

mod events;
mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/events", post(events::receive_event))
        .with_state(state)
}

pub use events::*;
pub use health::*;
