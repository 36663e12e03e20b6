use std::sync::Arc;

use githook_pipeline::RequestHandler;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Receives every webhook body and produces the response body.
    pub handler: Arc<dyn RequestHandler>,
}

impl AppState {
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self { handler }
    }
}
