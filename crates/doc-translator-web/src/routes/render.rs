//! Download route - renders posted text to TXT or PDF.

use axum::{
    body::Body,
    extract::{Form, State},
    http::{StatusCode, header},
    response::Response,
};
use doc_translator_core::{OutputFormat, TranslatedText};
use std::sync::Arc;
use tracing::info;

use super::RenderForm;
use crate::helpers::{CoreResultExt, ResultExt, RouteResult, attachment_disposition, sanitize_file_name};
use crate::state::AppState;

/// Render translated text and return it as an attachment.
pub async fn render_download(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RenderForm>,
) -> RouteResult<Response> {
    let format: OutputFormat = form.format.parse().or_status()?;
    let base_name = sanitize_file_name(&form.file_name);

    // Browsers submit form line breaks as CRLF
    let text = TranslatedText::new(form.text.replace("\r\n", "\n"), 1);

    let artifact = state.translator.render(&text, format, &base_name).await.or_status()?;
    info!("Serving {} ({} bytes)", artifact.file_name, artifact.bytes.len());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.mime_type())
        .header(header::CONTENT_DISPOSITION, attachment_disposition(&artifact.file_name))
        .body(Body::from(artifact.bytes))
        .or_internal_error()
}
