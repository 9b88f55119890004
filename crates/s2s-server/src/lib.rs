//! s2s-server - HTTP host for the Singular S2S event mapper.
//!
//! Accepts Segment events on `POST /events` and forwards track calls to the
//! Singular S2S endpoint. Retryable failures answer `503` so the upstream
//! pipeline redelivers; unsupported event types answer `400`.
//!
//! # Example
//!
//! ```ignore
//! use s2s_server::{create_server, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::from_env().unwrap();
//!     let app = create_server(AppState::from_config(&config).unwrap());
//!
//!     let listener = tokio::net::TcpListener::bind(config.addr().unwrap()).await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
