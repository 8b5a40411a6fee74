//! Page routes - full HTML page renders.

use axum::extract::State;
use std::sync::Arc;

use super::MAX_UPLOAD_MB;
use crate::state::AppState;
use crate::templates::IndexTemplate;

/// Landing page with upload form.
pub async fn index(State(state): State<Arc<AppState>>) -> IndexTemplate {
    IndexTemplate::new(&state.translator, MAX_UPLOAD_MB)
}
