use thiserror::Error;

/// Unified error type for doc-translator-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Document loading (unsupported formats, unreadable files)
/// - OCR (missing engine or language pack, no recognizable text)
/// - Translation (service failures, rate limiting)
/// - Output rendering (engine failures, missing glyph coverage)
/// - Configuration and general I/O
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Document Loading Errors
    // ==========================================================================
    /// The declared file type is not one of the supported formats
    #[error("unsupported file format '{0}' (supported: PDF, DOCX, TXT, JPG, JPEG, PNG, BMP, TIFF)")]
    UnsupportedFormat(String),

    /// The underlying parser could not read the file
    #[error("failed to extract text from {format}: {reason}")]
    Extraction { format: &'static str, reason: String },

    // ==========================================================================
    // OCR Errors
    // ==========================================================================
    /// OCR engine binary or its language pack is not installed
    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    /// The OCR engine found no recognizable glyphs
    #[error("no text detected in image")]
    NoTextDetected,

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Network, authentication or response failure from the translation service
    #[error("translation service error: {0}")]
    TranslationService(String),

    /// The translation service signalled throttling
    #[error("translation service rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    // ==========================================================================
    // Rendering Errors
    // ==========================================================================
    /// Rendering engine unavailable or failed, or the font lacks glyphs
    #[error("failed to render {format} output: {reason}")]
    Render { format: &'static str, reason: String },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn extraction(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Extraction {
            format,
            reason: reason.into(),
        }
    }

    pub(crate) fn render(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Render {
            format,
            reason: reason.into(),
        }
    }

    /// Whether this error aborts the current request.
    ///
    /// `NoTextDetected` is the only condition that degrades to an empty
    /// result with a warning.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::NoTextDetected)
    }

    /// Readable message for end users.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedFormat(_) => {
                "Unsupported file format. Please upload PDF, DOCX, TXT, or image files.".to_string()
            }
            Self::NoTextDetected => {
                "No text could be detected in the document. Try a clearer scan or disable OCR."
                    .to_string()
            }
            Self::RateLimited { .. } => {
                format!("{self}. Please wait a moment and try again.")
            }
            _ => {
                let mut message = self.to_string();
                if let Some(first) = message.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                message
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_no_text_is_non_fatal() {
        assert!(!Error::NoTextDetected.is_fatal());
        assert!(Error::UnsupportedFormat(".xyz".into()).is_fatal());
        assert!(Error::RateLimited { retry_after: None }.is_fatal());
        assert!(Error::render("pdf", "engine missing").is_fatal());
    }

    #[test]
    fn test_rate_limited_message() {
        let err = Error::RateLimited { retry_after: Some(30) };
        assert_eq!(err.to_string(), "translation service rate limited, retry after 30 seconds");
        let err = Error::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "translation service rate limited");
    }

    #[test]
    fn test_user_message_capitalizes() {
        let err = Error::extraction("DOCX", "missing word/document.xml");
        assert_eq!(
            err.user_message(),
            "Failed to extract text from DOCX: missing word/document.xml"
        );
    }
}
