use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub counter_store: &'static str,
}

/// Liveness plus counter store status. Always 200: a missing or unreachable
/// store degrades view counts, not the site.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.views.status().await;
    Json(HealthResponse {
        status: "ok",
        counter_store: store.as_str(),
    })
}
