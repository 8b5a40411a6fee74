//! HTTP route handlers for the document translator web application.
//!
//! `/api/translate` returns an HTML fragment; `/api/render` returns the
//! downloadable file. Nothing is stored between the two: the fragment's
//! download forms post the translated text back.

mod health;
mod pages;
mod render;
mod translate;

pub use health::health;
pub use pages::index;
pub use render::render_download;
pub use translate::translate_document;

use serde::Deserialize;

/// Upload size limit, in megabytes.
pub const MAX_UPLOAD_MB: usize = 50;

/// Form posted by the download buttons.
#[derive(Deserialize)]
pub struct RenderForm {
    pub text: String,
    pub format: String,
    /// Download name without extension
    #[serde(default)]
    pub file_name: String,
}
