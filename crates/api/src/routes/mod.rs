pub mod health;
pub mod webhook;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// `GET /health` plus the webhook catch-all.
///
/// Every request that is not a health check, whatever its path or method, is
/// treated as a webhook delivery.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/health",
            get(health::health_check).fallback(webhook::deliver),
        )
        .fallback(webhook::deliver)
}
