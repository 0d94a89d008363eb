use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use std::sync::Arc;

use crate::recovery::{Dispatcher, RawEvent};

/// POST /invoke - Event lokal durch den Dispatcher schicken
pub async fn invoke(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(event): Json<RawEvent>,
) -> (StatusCode, Json<serde_json::Value>) {
    let response = dispatcher.dispatch(event).await;
    (response.status(), Json(response.body))
}

/// Router für lokale Invocations
pub fn invoke_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/invoke", post(invoke))
        .with_state(dispatcher)
}
