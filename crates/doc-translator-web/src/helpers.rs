//! Helper types and traits for cleaner route handlers.
//!
//! Provides extension traits for converting library errors into
//! HTTP-appropriate error responses, reducing boilerplate in routes.

use axum::http::StatusCode;
use doc_translator_core::Error;
use tracing::{error, warn};

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;

    /// Converts the error to 400 Bad Request.
    fn or_bad_request(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }

    fn or_bad_request(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
    }
}

/// Extension trait mapping library errors to their HTTP status.
pub trait CoreResultExt<T> {
    /// Converts the error to its status with a user-facing message.
    fn or_status(self) -> RouteResult<T>;
}

impl<T> CoreResultExt<T> for doc_translator_core::Result<T> {
    fn or_status(self) -> RouteResult<T> {
        self.map_err(|e| {
            let status = error_status(&e);
            if status.is_server_error() {
                error!("Request failed: {}", e);
            } else {
                warn!("Request rejected: {}", e);
            }
            (status, e.user_message())
        })
    }
}

/// HTTP status for a library error.
pub const fn error_status(err: &Error) -> StatusCode {
    match err {
        Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        Error::Extraction { .. } | Error::NoTextDetected => StatusCode::UNPROCESSABLE_ENTITY,
        Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        Error::TranslationService(_) => StatusCode::BAD_GATEWAY,
        Error::OcrUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Render { .. } | Error::ConfigLoad(_) | Error::ConfigInvalid { .. } | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Strip anything that could escape a header value or a path from a
/// client-supplied file name.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|'))
        .collect();
    let cleaned = cleaned.trim().trim_matches('.');
    if cleaned.is_empty() {
        "translation".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `Content-Disposition` value for a download.
///
/// Non-ASCII names (Sinhala file names are common) go in `filename*`,
/// with an ASCII fallback in `filename`.
pub fn attachment_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}
