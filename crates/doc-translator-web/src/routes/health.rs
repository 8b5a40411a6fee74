use axum::Json;
use axum::extract::State;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
    pub ocr_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_error: Option<String>,
}

/// Liveness plus a report on the external tools translation depends on.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ocr = state.translator.ocr_status().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.translator.translator_name(),
        ocr_available: ocr.is_ok(),
        ocr_error: ocr.err().map(|e| e.to_string()),
    })
}
