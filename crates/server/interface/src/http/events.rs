//! Direct event submission, bypassing the bus.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use eventide_server_domain::IncomingEvent;

use super::AppState;

/// Run an event through the engine synchronously and acknowledge it.
pub async fn submit(
    State(state): State<AppState>,
    Json(event): Json<IncomingEvent>,
) -> (StatusCode, Json<Value>) {
    state.engine.process(&event).await;

    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "accepted", "eventId": event.event_id })),
    )
}
