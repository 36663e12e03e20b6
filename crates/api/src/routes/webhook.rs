use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::state::AppState;

/// Hand the raw body to the request handler and return its bytes with
/// status 200, including when the handler reports an error.
pub async fn deliver(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let response = state.handler.handle(&body);
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], response)
}
