//! OCR adapter.
//!
//! Text recognition is delegated to an external engine behind the
//! [`OcrEngine`] trait; [`TesseractEngine`] drives the `tesseract` CLI.

mod tesseract;

pub use tesseract::TesseractEngine;

use async_trait::async_trait;

use crate::error::Result;

/// Trait for OCR backends
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &'static str;

    /// Language model used when the caller does not name one
    fn default_language(&self) -> &str;

    /// Verify the engine and the language pack are installed.
    ///
    /// Fails with `OcrUnavailable` otherwise.
    async fn ensure_available(&self, language: &str) -> Result<()>;

    /// Recognize text in an encoded image (PNG, JPEG, BMP, TIFF).
    ///
    /// Fails with `NoTextDetected` when no glyphs are recognized.
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String>;
}
