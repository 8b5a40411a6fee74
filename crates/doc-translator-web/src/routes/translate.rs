//! Translation route - upload, extract and translate in one request.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use doc_translator_core::{Document, Extraction, Outcome};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::helpers::{ResultExt, RouteResult, error_status};
use crate::state::AppState;
use crate::templates::TranslateResultTemplate;

/// Uploaded form fields.
struct Upload {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
    use_ocr: bool,
}

/// Translate an uploaded document - returns the result fragment.
///
/// Library errors render as an error fragment with the matching status;
/// only malformed multipart bodies are rejected outright.
pub async fn translate_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> RouteResult<Response> {
    let request_id = Uuid::new_v4();
    let span = info_span!("translate", %request_id);
    handle_upload(&state, multipart).instrument(span).await
}

async fn handle_upload(state: &AppState, multipart: Multipart) -> RouteResult<Response> {
    let upload = read_upload(multipart).await?;
    info!(
        "Received {} ({} bytes, ocr: {})",
        upload.file_name,
        upload.bytes.len(),
        upload.use_ocr
    );

    let response = match translate_upload(state, upload).await {
        Ok(template) => template.into_response(),
        Err(e) => {
            let status = error_status(&e);
            if status.is_server_error() {
                error!("Translation failed: {}", e);
            } else {
                warn!("Translation rejected: {}", e);
            }
            (status, TranslateResultTemplate::error(e.user_message())).into_response()
        }
    };
    Ok(response)
}

async fn read_upload(mut multipart: Multipart) -> RouteResult<Upload> {
    let mut file = None;
    let mut use_ocr = false;

    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.or_bad_request()?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            "use_ocr" => {
                let value = field.text().await.or_bad_request()?;
                use_ocr = is_checked(&value);
            }
            other => debug!("Ignoring form field '{}'", other),
        }
    }

    let Some((file_name, content_type, bytes)) = file else {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    };

    Ok(Upload {
        file_name,
        content_type,
        bytes,
        use_ocr,
    })
}

async fn translate_upload(state: &AppState, upload: Upload) -> doc_translator_core::Result<TranslateResultTemplate> {
    let translator = &state.translator;
    let doc = Document::new(upload.bytes, upload.file_name, upload.content_type.as_deref())?;
    let base_name = translator.output_base_name(doc.file_name());

    let outcome = match translator.extract(&doc, upload.use_ocr).await? {
        Extraction::Empty { warning } => Outcome {
            warning: Some(warning),
            ..Outcome::default()
        },
        Extraction::Text(extracted) => {
            let translated = translator.translate(&extracted, None).await?;
            Outcome {
                extracted: Some(extracted),
                translated: Some(translated),
                ..Outcome::default()
            }
        }
    };

    Ok(TranslateResultTemplate::from_outcome(&outcome, base_name))
}

/// Checkbox values as browsers and scripts send them.
fn is_checked(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_checked() {
        assert!(is_checked("on"));
        assert!(is_checked("TRUE"));
        assert!(!is_checked(""));
        assert!(!is_checked("off"));
    }
}
